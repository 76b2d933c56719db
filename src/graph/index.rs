//! Immutable in-memory plant graph.
//!
//! Uses `petgraph` for the graph structure and a name index for O(1) node
//! lookups. The graph is built once from facts and never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::TwinResult;
use crate::fact::{self, Fact};

use super::{EdgeData, Node};

/// Directed graph of plant components.
///
/// At most one edge exists per ordered (subject, object) pair. When several
/// facts share a pair, the last one loaded wins.
pub struct PlantGraph {
    /// Nodes in first-appearance order, edges carry the fact annotations.
    graph: DiGraph<Node, EdgeData>,
    /// Component name → NodeIndex mapping.
    node_index: HashMap<String, NodeIndex>,
}

impl PlantGraph {
    /// Read a fact file and build the graph from it.
    pub fn load(path: &Path) -> TwinResult<Self> {
        let facts = fact::load_file(path)?;
        let plant = Self::build(&facts);
        if plant.is_empty() {
            tracing::warn!(path = %path.display(), "fact file holds no facts");
        }
        Ok(plant)
    }

    /// Build the graph from facts, in order.
    pub fn build(facts: &[Fact]) -> Self {
        let mut plant = Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        };

        for fact in facts {
            let subj = plant.ensure_node(&fact.subject, &fact.subject_class);
            let obj = plant.ensure_node(&fact.object, &fact.object_class);

            if let Some(existing) = plant.graph.find_edge(subj, obj) {
                tracing::debug!(
                    subject = %fact.subject,
                    object = %fact.object,
                    old = %plant.graph[existing].label,
                    new = %fact.predicate,
                    "overwriting edge label"
                );
            }
            plant.graph.update_edge(subj, obj, EdgeData::from(fact));
        }

        tracing::info!(
            facts = facts.len(),
            nodes = plant.node_count(),
            edges = plant.edge_count(),
            "built plant graph"
        );
        plant
    }

    /// Ensure a node exists for the given component and set its category.
    fn ensure_node(&mut self, name: &str, category: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(name) {
            self.graph[idx].category = category.to_string();
            return idx;
        }
        let idx = self.graph.add_node(Node {
            name: name.to_string(),
            category: category.to_string(),
        });
        self.node_index.insert(name.to_string(), idx);
        idx
    }

    /// Number of components.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct directed relations.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up a component by exact name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node_index.get(name).map(|&idx| &self.graph[idx])
    }

    /// All components in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// The edge from `subject` to `object`, if any.
    pub fn edge(&self, subject: &str, object: &str) -> Option<&EdgeData> {
        let s = self.index_of(subject)?;
        let o = self.index_of(object)?;
        self.graph.find_edge(s, o).map(|e| &self.graph[e])
    }

    /// All edges as (subject, object, data), in first-insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node, &EdgeData)> {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    /// Direct predecessors of `name` with the incoming edge data.
    pub fn incoming(&self, name: &str) -> Vec<(&Node, &EdgeData)> {
        self.index_of(name)
            .map(|idx| self.adjacent(idx, Direction::Incoming))
            .unwrap_or_default()
    }

    /// Direct successors of `name` with the outgoing edge data.
    pub fn outgoing(&self, name: &str) -> Vec<(&Node, &EdgeData)> {
        self.index_of(name)
            .map(|idx| self.adjacent(idx, Direction::Outgoing))
            .unwrap_or_default()
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.node_index.get(name).copied()
    }

    pub(crate) fn name_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].name
    }

    /// Neighbor indices in edge-insertion order.
    ///
    /// petgraph walks adjacency lists newest-first; sorting by edge index
    /// restores the order facts were loaded in.
    pub(crate) fn neighbor_indices(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), other)
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, n)| n).collect()
    }

    fn adjacent(&self, idx: NodeIndex, dir: Direction) -> Vec<(&Node, &EdgeData)> {
        let mut edges: Vec<_> = self.graph.edges_directed(idx, dir).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (&self.graph[other], e.weight())
            })
            .collect()
    }
}

impl std::fmt::Debug for PlantGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlantGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(s: &str, p: &str, o: &str) -> Fact {
        Fact::new(s, "Pipe", p, o, "Valve")
    }

    #[test]
    fn build_creates_nodes_once() {
        let g = PlantGraph::build(&[fact("A", "feeds", "B"), fact("B", "feeds", "C")]);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        let names: Vec<_> = g.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn duplicate_pair_last_write_wins() {
        let g = PlantGraph::build(&[fact("X", "feeds", "Y"), fact("X", "regulates", "Y")]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge("X", "Y").unwrap().label, "regulates");
    }

    #[test]
    fn reversed_pair_is_a_separate_edge() {
        let g = PlantGraph::build(&[fact("X", "feeds", "Y"), fact("Y", "returnsTo", "X")]);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge("X", "Y").unwrap().label, "feeds");
        assert_eq!(g.edge("Y", "X").unwrap().label, "returnsTo");
    }

    #[test]
    fn category_follows_last_appearance() {
        let g = PlantGraph::build(&[
            Fact::new("Solenoid", "Valve", "feeds", "Coil", "Evaporator"),
            Fact::new("Thermostat", "Controller", "triggers", "Solenoid", "Controller"),
        ]);
        assert_eq!(g.node("Solenoid").unwrap().category, "Controller");
        assert_eq!(g.node("Coil").unwrap().category, "Evaporator");
    }

    #[test]
    fn adjacency_keeps_load_order() {
        let g = PlantGraph::build(&[
            fact("A", "feeds", "Z"),
            fact("B", "regulates", "Z"),
            fact("C", "triggers", "Z"),
        ]);
        let preds: Vec<_> = g.incoming("Z").iter().map(|(n, _)| n.name.clone()).collect();
        assert_eq!(preds, ["A", "B", "C"]);
        assert!(g.incoming("missing").is_empty());
    }

    #[test]
    fn load_reads_fact_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("raw_facts.json");
        std::fs::write(
            &path,
            r#"```json
[{"subject": "Compressor", "subject_class": "Compressor", "predicate": "feeds",
  "object": "Condenser", "object_class": "Condenser"}]
```"#,
        )
        .unwrap();

        let g = PlantGraph::load(&path).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge("Compressor", "Condenser").unwrap().label, "feeds");
    }

    #[test]
    fn load_missing_file_is_fact_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = PlantGraph::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::TwinError::Fact(crate::error::FactError::Io { .. })
        ));
    }

    #[test]
    fn empty_graph() {
        let g = PlantGraph::build(&[]);
        assert!(g.is_empty());
        assert_eq!(g.edges().count(), 0);
        assert!(g.edge("A", "B").is_none());
    }
}

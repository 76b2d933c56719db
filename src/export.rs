//! Export types for serializing the plant graph.
//!
//! These types provide a flat, name-resolved representation of the built
//! graph suitable for JSON export and for the `info` summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fact::Relation;
use crate::graph::{PlantGraph, PlantSide};

/// Exported component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    pub name: String,
    /// Class the component last appeared under.
    pub category: String,
    pub side: PlantSide,
}

/// Exported relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub subject_class: String,
    pub object_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<String>,
}

/// Full graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl GraphExport {
    pub fn from_graph(graph: &PlantGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|n| NodeExport {
                name: n.name.clone(),
                category: n.category.clone(),
                side: n.side(),
            })
            .collect();
        let edges = graph
            .edges()
            .map(|(s, o, e)| EdgeExport {
                subject: s.name.clone(),
                predicate: e.label.clone(),
                object: o.name.clone(),
                subject_class: e.subject_class.clone(),
                object_class: e.object_class.clone(),
                source_page: e.source_page.clone(),
            })
            .collect();
        Self { nodes, edges }
    }
}

/// Counts and groupings shown by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Component names per plant side, in load order. Empty sides are omitted.
    pub sides: Vec<(PlantSide, Vec<String>)>,
    /// Edge count per relation label.
    pub relations: BTreeMap<String, usize>,
    /// Labels outside the declared relation ontology, sorted.
    pub undeclared: Vec<String>,
}

impl GraphSummary {
    pub fn from_graph(graph: &PlantGraph) -> Self {
        let sides = PlantSide::ALL
            .into_iter()
            .map(|side| {
                let names: Vec<String> = graph
                    .nodes()
                    .filter(|n| n.side() == side)
                    .map(|n| n.name.clone())
                    .collect();
                (side, names)
            })
            .filter(|(_, names)| !names.is_empty())
            .collect();

        let mut relations = BTreeMap::new();
        for (_, _, edge) in graph.edges() {
            *relations.entry(edge.label.clone()).or_insert(0) += 1;
        }

        let undeclared = relations
            .keys()
            .filter(|label| Relation::parse(label).is_none())
            .cloned()
            .collect();

        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            sides,
            relations,
            undeclared,
        }
    }
}

impl std::fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Plant graph: {} components, {} relations", self.nodes, self.edges)?;
        for (side, names) in &self.sides {
            writeln!(f, "  {side} ({}):", names.len())?;
            for name in names {
                writeln!(f, "    - {name}")?;
            }
        }
        if !self.relations.is_empty() {
            writeln!(f, "  relations:")?;
            for (label, count) in &self.relations {
                writeln!(f, "    {label}: {count}")?;
            }
        }
        if !self.undeclared.is_empty() {
            writeln!(f, "  undeclared relations: {}", self.undeclared.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::Fact;

    fn plant() -> PlantGraph {
        PlantGraph::build(&[
            Fact::new("Compressor", "Compressor", "feeds", "Condenser", "Condenser"),
            Fact::new("Thermostat", "Controller", "triggers", "Compressor", "Compressor")
                .with_source_page("7"),
            Fact::new("Condenser", "Condenser", "feeds", "Receiver", "Tank"),
        ])
    }

    #[test]
    fn export_lists_nodes_and_edges() {
        let export = GraphExport::from_graph(&plant());
        assert_eq!(export.nodes.len(), 4);
        assert_eq!(export.edges.len(), 3);
        assert_eq!(export.nodes[3].side, PlantSide::Other);
        assert_eq!(export.edges[1].source_page.as_deref(), Some("7"));

        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains("\"side\":\"high-side\""));
    }

    #[test]
    fn summary_groups_by_side() {
        let summary = GraphSummary::from_graph(&plant());
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.relations["feeds"], 2);
        assert_eq!(
            summary.sides[0],
            (
                PlantSide::HighSide,
                vec!["Compressor".to_string(), "Condenser".to_string()]
            )
        );
        assert!(summary.sides.iter().all(|(_, names)| !names.is_empty()));
        assert!(summary.undeclared.is_empty());
        let text = summary.to_string();
        assert!(text.contains("control (1):"));
        assert!(!text.contains("undeclared"));
    }

    #[test]
    fn summary_flags_undeclared_relations() {
        let graph = PlantGraph::build(&[
            Fact::new("Compressor", "Compressor", "feeds", "Condenser", "Condenser"),
            Fact::new("Seawater Pump", "Pipe", "cools", "Condenser", "Condenser"),
            Fact::new("Oil Separator", "Pipe", "Feeds", "Compressor", "Compressor"),
            Fact::new("Receiver", "Pipe", "cools", "Compressor", "Compressor"),
        ]);
        let summary = GraphSummary::from_graph(&graph);
        assert_eq!(summary.relations["cools"], 2);
        assert_eq!(summary.undeclared, ["Feeds", "cools"]);
        assert!(
            summary
                .to_string()
                .contains("undeclared relations: Feeds, cools")
        );
    }
}

//! The four structural queries over a built plant graph.
//!
//! Every query first resolves its component argument with
//! [`resolve`](super::resolve::resolve) and fails with
//! [`GraphError::ComponentNotFound`] when nothing matches.

use petgraph::Direction;

use crate::error::{GraphError, IntentError};

use super::Influence;
use super::index::PlantGraph;
use super::resolve::resolve;
use super::traverse::closure;

/// Result type for graph queries.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// The structural query kinds, named as the intent classifier names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    WhoAffects,
    WhatItAffects,
    UpstreamDependencies,
    DownstreamImpact,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        Self::WhoAffects,
        Self::WhatItAffects,
        Self::UpstreamDependencies,
        Self::DownstreamImpact,
    ];

    /// Look up a query kind by its exact wire name, e.g. `"who_affects"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhoAffects => "who_affects",
            Self::WhatItAffects => "what_it_affects",
            Self::UpstreamDependencies => "upstream_dependencies",
            Self::DownstreamImpact => "downstream_impact",
        }
    }

    /// Message shown when the query finds nothing.
    pub fn none_found(self) -> &'static str {
        match self {
            Self::WhoAffects => "No influencing components found.",
            Self::WhatItAffects => "No affected components found.",
            Self::UpstreamDependencies => "No upstream dependencies found.",
            Self::DownstreamImpact => "No downstream impact found.",
        }
    }
}

impl std::str::FromStr for QueryKind {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| IntentError::UnknownQueryType {
            query_type: s.to_string(),
        })
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a query: direct neighbors with relations, or a transitive set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Relations(Vec<Influence>),
    Components(Vec<String>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Relations(r) => r.len(),
            Self::Components(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One display line per entry.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Relations(r) => r.iter().map(ToString::to_string).collect(),
            Self::Components(c) => c.clone(),
        }
    }
}

/// Query facade over a borrowed, immutable graph.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'g> {
    graph: &'g PlantGraph,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g PlantGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g PlantGraph {
        self.graph
    }

    /// What can influence `component`: every direct predecessor with its relation.
    pub fn who_affects(&self, component: &str) -> GraphResult<Vec<Influence>> {
        let name = resolve(self.graph, component)?;
        Ok(self
            .graph
            .incoming(name)
            .into_iter()
            .map(|(node, edge)| Influence::new(&node.name, &edge.label))
            .collect())
    }

    /// What `component` directly influences.
    pub fn what_it_affects(&self, component: &str) -> GraphResult<Vec<Influence>> {
        let name = resolve(self.graph, component)?;
        Ok(self
            .graph
            .outgoing(name)
            .into_iter()
            .map(|(node, edge)| Influence::new(&node.name, &edge.label))
            .collect())
    }

    /// Every component with a directed path ending at `component`.
    ///
    /// Deduplicated; order is discovery order and carries no meaning.
    pub fn upstream_dependencies(&self, component: &str) -> GraphResult<Vec<String>> {
        self.transitive(component, Direction::Incoming)
    }

    /// Every component reachable from `component`.
    pub fn downstream_impact(&self, component: &str) -> GraphResult<Vec<String>> {
        self.transitive(component, Direction::Outgoing)
    }

    /// Run a query by kind.
    pub fn run(&self, kind: QueryKind, component: &str) -> GraphResult<QueryResult> {
        tracing::debug!(query = %kind, component, "running graph query");
        Ok(match kind {
            QueryKind::WhoAffects => QueryResult::Relations(self.who_affects(component)?),
            QueryKind::WhatItAffects => QueryResult::Relations(self.what_it_affects(component)?),
            QueryKind::UpstreamDependencies => {
                QueryResult::Components(self.upstream_dependencies(component)?)
            }
            QueryKind::DownstreamImpact => {
                QueryResult::Components(self.downstream_impact(component)?)
            }
        })
    }

    fn transitive(&self, component: &str, direction: Direction) -> GraphResult<Vec<String>> {
        let name = resolve(self.graph, component)?;
        let start = self
            .graph
            .index_of(name)
            .ok_or_else(|| GraphError::ComponentNotFound {
                name: component.to_string(),
            })?;
        Ok(closure(self.graph, start, direction)
            .into_iter()
            .map(|idx| self.graph.name_of(idx).to_string())
            .collect())
    }
}

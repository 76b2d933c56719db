//! Plant knowledge graph: components as nodes, extracted relations as edges.
//!
//! - [`PlantGraph`] ([`index`]): immutable petgraph-backed store built once from facts
//! - [`resolve`]: maps free-text component mentions to node names
//! - [`traverse`]: cycle-safe transitive closure in either edge direction
//! - [`query`]: the four structural queries over a built graph

pub mod index;
pub mod query;
pub mod resolve;
pub mod traverse;

use serde::{Deserialize, Serialize};

use crate::fact::{ComponentClass, Fact};

pub use index::PlantGraph;
pub use query::{QueryEngine, QueryKind, QueryResult};

/// A plant component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Exact component name as extracted, e.g. "Room Thermostat".
    pub name: String,
    /// Class under which the component last appeared in a fact.
    pub category: String,
}

impl Node {
    /// Presentation group of this component.
    pub fn side(&self) -> PlantSide {
        PlantSide::of_category(&self.category)
    }
}

/// Edge data stored on petgraph edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// The predicate of the fact that last wrote this edge.
    pub label: String,
    pub subject_class: String,
    pub object_class: String,
    pub source_page: Option<String>,
}

impl From<&Fact> for EdgeData {
    fn from(f: &Fact) -> Self {
        Self {
            label: f.predicate.clone(),
            subject_class: f.subject_class.clone(),
            object_class: f.object_class.clone(),
            source_page: f.source_page.clone(),
        }
    }
}

/// Side of the refrigeration cycle a component belongs to, for grouping output.
///
/// Has no effect on traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlantSide {
    HighSide,
    LowSide,
    Control,
    Other,
}

impl PlantSide {
    pub const ALL: [PlantSide; 4] = [Self::HighSide, Self::LowSide, Self::Control, Self::Other];

    /// Group a category string. Undeclared classes fall into [`PlantSide::Other`].
    pub fn of_category(category: &str) -> Self {
        match ComponentClass::parse(category) {
            Some(ComponentClass::Compressor | ComponentClass::Condenser) => Self::HighSide,
            Some(ComponentClass::Evaporator | ComponentClass::Valve | ComponentClass::Pipe) => {
                Self::LowSide
            }
            Some(ComponentClass::Controller | ComponentClass::Sensor) => Self::Control,
            None => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighSide => "high-side",
            Self::LowSide => "low-side",
            Self::Control => "control",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PlantSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direct neighbor together with the relation connecting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Influence {
    pub component: String,
    pub relation: String,
}

impl Influence {
    pub fn new(component: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            relation: relation.into(),
        }
    }
}

impl std::fmt::Display for Influence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.component, self.relation)
    }
}

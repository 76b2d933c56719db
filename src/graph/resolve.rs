//! Component name resolution.
//!
//! Questions mention components loosely ("room_thermostat", "the compressor").
//! [`resolve`] is the strict path used by every query; [`resolve_by_token_subset`]
//! is the looser best-effort path used for fault-impact questions.

use std::collections::HashSet;

use crate::error::GraphError;

use super::index::PlantGraph;

/// Filler word ignored by token-subset matching.
const FILLER: &str = "the";

/// Normalize a component mention: lower-case, underscores as spaces, trimmed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace('_', " ").trim().to_string()
}

/// Resolve a mention to a node name by exact match after normalization.
///
/// Node names are assumed unique modulo case and underscores; if two nodes
/// collide, the first in load order wins.
pub fn resolve<'g>(graph: &'g PlantGraph, text: &str) -> Result<&'g str, GraphError> {
    let wanted = normalize(text);
    graph
        .nodes()
        .find(|node| normalize(&node.name) == wanted)
        .map(|node| node.name.as_str())
        .ok_or_else(|| GraphError::ComponentNotFound {
            name: text.to_string(),
        })
}

/// Resolve a phrase to the first node whose tokens are a superset of the
/// phrase's tokens (ignoring "the").
///
/// Ambiguous when several nodes qualify: the first one in load order is
/// returned. Treat the answer as best effort.
pub fn resolve_by_token_subset<'g>(
    graph: &'g PlantGraph,
    phrase: &str,
) -> Result<&'g str, GraphError> {
    let wanted: HashSet<String> = tokens(phrase)
        .into_iter()
        .filter(|t| t != FILLER)
        .collect();

    let not_found = || GraphError::ComponentNotFound {
        name: phrase.trim().to_string(),
    };

    if wanted.is_empty() {
        return Err(not_found());
    }

    let found = graph
        .nodes()
        .find(|node| tokens(&node.name).is_superset(&wanted))
        .map(|node| node.name.as_str());

    tracing::debug!(phrase, ?found, "token-subset resolution");
    found.ok_or_else(not_found)
}

fn tokens(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

//! Transitive closure over the plant graph.
//!
//! BFS from a start node along edges in one direction. Every node is queued at
//! most once, so cycles (control and feedback loops are common in a plant)
//! terminate.

use std::collections::{HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use super::index::PlantGraph;

/// Collect every node reachable from `start` by a non-empty path in `direction`.
///
/// `Direction::Outgoing` yields descendants, `Direction::Incoming` ancestors.
/// Nodes come back in discovery order. The start node itself appears only if
/// it lies on a cycle.
pub fn closure(graph: &PlantGraph, start: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut reached = Vec::new();

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbor_indices(node, direction) {
            if visited.insert(next) {
                reached.push(next);
                queue.push_back(next);
            }
        }
    }

    reached
}

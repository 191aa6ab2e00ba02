//! Batch-scoped dense graph for relational message passing.
//!
//! A `DenseGraph` describes, for one forward pass, the batch's target nodes
//! and their neighbors grouped by relation type and edge direction. It is
//! read-only to the layer that consumes it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Direction in which a relational edge contributes to a target node.
///
/// Every edge contributes twice: once to its head in the relation's natural
/// direction, once to its tail in the reverse direction. Each direction has
/// an independently learned transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The relation's natural direction (source -> target).
    Outgoing,
    /// The reverse of the relation (target -> source, seen from the target).
    Incoming,
}

/// Per-relation adjacency for one direction: target node -> source nodes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Adjacency {
    neighbors: HashMap<String, Vec<String>>,
}

/// Neighbor structure for a batch of target nodes.
///
/// Relation indices are bare `usize` values; range checking against a
/// layer's relation count happens in the layer, not here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DenseGraph {
    /// Target nodes of the batch, in output order.
    targets: Vec<String>,
    /// Adjacency per relation index, natural direction.
    outgoing: HashMap<usize, Adjacency>,
    /// Adjacency per relation index, reverse direction.
    incoming: HashMap<usize, Adjacency>,
    /// Total number of edges added.
    num_edges: usize,
}

impl DenseGraph {
    /// Create a graph for the given batch of target nodes.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            num_edges: 0,
        }
    }

    /// Record that `target` has neighbor `source` under `relation` in the
    /// given direction.
    pub fn add_edge(&mut self, relation: usize, direction: Direction, target: &str, source: &str) {
        let side = match direction {
            Direction::Outgoing => &mut self.outgoing,
            Direction::Incoming => &mut self.incoming,
        };
        side.entry(relation)
            .or_default()
            .neighbors
            .entry(target.to_string())
            .or_default()
            .push(source.to_string());
        self.num_edges += 1;
    }

    /// Target nodes of the batch.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Neighbors of `target` under `relation` in the given direction.
    ///
    /// Returns an empty slice when the node has no neighbors there; an empty
    /// neighbor set is a defined zero contribution, not an error.
    pub fn neighbors(&self, relation: usize, direction: Direction, target: &str) -> &[String] {
        let side = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        side.get(&relation)
            .and_then(|adj| adj.neighbors.get(target))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Highest relation index referenced by any edge, if any edge exists.
    pub fn max_relation(&self) -> Option<usize> {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .copied()
            .max()
    }

    /// Total number of edges added.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

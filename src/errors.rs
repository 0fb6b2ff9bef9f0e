//! Overlay Tree Error Hierarchy
//!
//! Expected absence (a missing key, an empty tree, a tree id nobody has
//! written to yet) is never an error: lookups return `Option`/`bool` and
//! mutations return an empty [`ModifiedKeys`](crate::ModifiedKeys) set.
//! The types below cover configuration, export and diagnostics failures.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Structural invariant violations reported by tree diagnostics
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Export serialization failures (adjacency list, force graph)
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Violations detected by [`SpanningTree::check_invariants`].
///
/// Keys are rendered with their `Debug` form so the error stays non-generic.
///
/// [`SpanningTree::check_invariants`]: crate::SpanningTree::check_invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Some nodes held by the tree are not reachable from the root
    #[error("Tree is disconnected: {reachable} of {total} nodes reachable from root")]
    Disconnected { reachable: usize, total: usize },

    /// Edge count does not match a tree over the reachable nodes
    #[error("Tree contains a cycle: {edges} edges over {nodes} nodes")]
    Cycle { edges: usize, nodes: usize },

    /// `from` lists `to` as a neighbor but not the other way around
    #[error("Edge {from} -> {to} has no reverse edge")]
    AsymmetricEdge { from: String, to: String },

    /// A node holds more neighbors than the configured bound
    #[error("Node {key} has degree {degree}, exceeding the bound of {max_degree}")]
    DegreeExceeded {
        key: String,
        degree: usize,
        max_degree: usize,
    },

    /// Two reachable nodes share a key
    #[error("Key {key} appears more than once")]
    DuplicateKey { key: String },

    /// The tree has no root but still owns nodes, or the other way around
    #[error("Root is missing while {nodes} nodes remain")]
    OrphanedNodes { nodes: usize },
}

//! Topology export: adjacency lists and the force-directed graph shape.

mod adjacency_list;
mod force_graph;

pub use adjacency_list::*;
pub use force_graph::*;

//! Undirected graph primitives backing the overlay tree.
//!
//! Nodes live in an arena ([`Graph`]) and refer to each other through
//! [`NodeId`]s, so edges are plain set edits with no aliasing. The graph
//! itself enforces only edge symmetry; tree shape and the degree bound are
//! the business of [`SpanningTree`](crate::SpanningTree).

mod arena;
mod node;
mod traversal;

pub use arena::*;
pub use node::*;
pub use traversal::*;

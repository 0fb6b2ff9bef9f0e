//! The overlay spanning tree and its lock-guarded wrapper.

mod concurrent_tree;
mod spanning_tree;

pub use concurrent_tree::*;
pub use spanning_tree::*;

#[cfg(test)]
mod concurrent_tree_test;

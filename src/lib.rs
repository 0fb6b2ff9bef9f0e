//! # overlay-tree
//!
//! Bounded-degree overlay spanning trees with per-tree change notifications.
//!
//! Each tree keeps a dynamic set of keyed nodes connected as a shallow,
//! cycle-free graph in which no node has more than `max_degree` neighbors, so
//! updates can be relayed along the tree instead of a full mesh.
//!
//! ## What this crate provides
//!
//! - **Insertion** - new keys attach under the branch with the nearest leaf
//! - **Local repair** - deleting a key promotes a leaf into the gap
//! - **Topology export** - adjacency lists and a force-directed graph shape
//! - **Change fanout** - subscribers learn which keys each mutation touched
//!
//! Transport, authentication and message framing are **your responsibility**;
//! the crate only needs a way to push [`ChangeEvent`]s to clients.
//!
//! ## Quick start
//!
//! ```rust
//! use overlay_tree::OverlayConfig;
//! use overlay_tree::TreeRegistry;
//!
//! let registry: TreeRegistry<String, u32> = TreeRegistry::new(OverlayConfig::default())?;
//! registry.upsert("room-1", "alice".to_string(), 1);
//! let modified = registry.upsert("room-1", "bob".to_string(), 2);
//!
//! assert!(modified.contains("alice"));
//! assert_eq!(registry.find("room-1", &"bob".to_string()), Some(2));
//! # Ok::<(), overlay_tree::Error>(())
//! ```
//!
//! ## Key Types
//!
//! - [`SpanningTree`] - the single-threaded tree algorithms
//! - [`ConcurrentTree`] - one tree behind a reader/writer lock
//! - [`TreeRegistry`] - named trees plus their change streams
//! - [`ChangeFanout`] - keyed delivery of [`ChangeEvent`]s

pub mod config;
mod errors;

mod adjacency;
mod fanout;
mod graph;
mod registry;
mod tree;

pub use adjacency::*;
pub use config::*;
pub use errors::*;
pub use fanout::*;
pub use graph::*;
pub use registry::*;
pub use tree::*;

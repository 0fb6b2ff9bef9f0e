//! Named trees and their change notifications.

mod tree_registry;


pub use tree_registry::*;

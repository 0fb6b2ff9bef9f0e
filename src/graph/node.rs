use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Bounds every node key must satisfy.
///
/// Keys are compared for identity, hashed for visited tracking and ordered
/// so modified-key sets and exports are deterministic.
pub trait NodeKey: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> NodeKey for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// Keys of every node whose own value or neighbor list changed during one
/// mutation. Used for change notification only.
pub type ModifiedKeys<K> = BTreeSet<K>;

/// Stable arena index of a node. Ids are never reused by the graph that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A keyed vertex with its payload and the ids of its neighbors.
///
/// A node has no ordering semantics; its position in the tree is purely
/// structural.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) neighbors: BTreeSet<NodeId>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(
        key: K,
        value: V,
    ) -> Self {
        Self {
            key,
            value,
            neighbors: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn neighbors(&self) -> &BTreeSet<NodeId> {
        &self.neighbors
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_isolated(&self) -> bool {
        self.neighbors.is_empty()
    }
}

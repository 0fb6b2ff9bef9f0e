use parking_lot::RwLock;
use tracing::debug;

use super::SpanningTree;
use crate::AdjacencyList;
use crate::ModifiedKeys;
use crate::NodeKey;
use crate::TreeConfig;

/// A [`SpanningTree`] behind one reader/writer lock.
///
/// Mutations hold the lock exclusively for their whole duration; reads share
/// it. Callers block until the lock is available.
pub struct ConcurrentTree<K, V> {
    inner: RwLock<TreeState<K, V>>,
}

pub(crate) struct TreeState<K, V> {
    tree: SpanningTree<K, V>,
    /// Set by the registry once the tree emptied and was scheduled for removal
    retired: bool,
}

impl<K: NodeKey, V> std::fmt::Debug for ConcurrentTree<K, V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("ConcurrentTree")
            .field("max_degree", &state.tree.max_degree())
            .field("root", &state.tree.root_key())
            .field("retired", &state.retired)
            .finish()
    }
}

impl<K: NodeKey, V> ConcurrentTree<K, V> {
    pub fn new(max_degree: usize) -> Self {
        Self::from_tree(SpanningTree::new(max_degree))
    }

    pub fn with_config(config: &TreeConfig) -> Self {
        Self::from_tree(SpanningTree::with_config(config))
    }

    pub fn from_tree(tree: SpanningTree<K, V>) -> Self {
        Self {
            inner: RwLock::new(TreeState {
                tree,
                retired: false,
            }),
        }
    }

    /// Provides shared access to the tree
    pub fn blocking_read<R>(
        &self,
        f: impl FnOnce(&SpanningTree<K, V>) -> R,
    ) -> R {
        let guard = self.inner.read();
        f(&guard.tree)
    }

    /// Provides exclusive access to the tree
    pub fn blocking_write<R>(
        &self,
        f: impl FnOnce(&mut SpanningTree<K, V>) -> R,
    ) -> R {
        let mut guard = self.inner.write();
        f(&mut guard.tree)
    }

    pub fn upsert(
        &self,
        key: K,
        value: V,
    ) -> ModifiedKeys<K> {
        self.blocking_write(|tree| tree.upsert(key, value))
    }

    pub fn delete_by_key(
        &self,
        key: &K,
    ) -> ModifiedKeys<K> {
        self.blocking_write(|tree| tree.delete_by_key(key))
    }

    pub fn find(
        &self,
        key: &K,
    ) -> Option<V>
    where
        V: Clone,
    {
        self.blocking_read(|tree| tree.find(key).cloned())
    }

    pub fn has(
        &self,
        key: &K,
    ) -> bool {
        self.blocking_read(|tree| tree.has(key))
    }

    pub fn adjacency_list(&self) -> AdjacencyList<K, V>
    where
        V: Clone,
    {
        self.blocking_read(|tree| tree.adjacency_list())
    }

    pub fn is_empty(&self) -> bool {
        self.blocking_read(|tree| tree.is_empty())
    }

    pub fn len(&self) -> usize {
        self.blocking_read(|tree| tree.len())
    }

    /// True once the registry has detached this tree. A handle to a retired
    /// tree still works but is no longer reachable through the registry.
    pub fn is_retired(&self) -> bool {
        self.inner.read().retired
    }

    /// Upserts unless the tree has been retired, in which case the key and
    /// value are handed back so the caller can retry on a fresh tree.
    pub(crate) fn upsert_if_live(
        &self,
        key: K,
        value: V,
    ) -> Result<ModifiedKeys<K>, (K, V)> {
        let mut guard = self.inner.write();
        if guard.retired {
            return Err((key, value));
        }
        Ok(guard.tree.upsert(key, value))
    }

    /// Deletes `key` and, if that leaves the tree empty, retires it before the
    /// lock is released. Returns the modified keys and whether it retired.
    pub(crate) fn delete_and_retire_if_empty(
        &self,
        key: &K,
    ) -> (ModifiedKeys<K>, bool) {
        let mut guard = self.inner.write();
        let modified = guard.tree.delete_by_key(key);
        if guard.tree.is_empty() && !guard.retired {
            guard.retired = true;
            debug!(?key, "Tree emptied and retired");
            return (modified, true);
        }
        (modified, false)
    }
}

use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::AdjacencyList;
use crate::ChangeFanout;
use crate::ConcurrentTree;
use crate::ForceGraph;
use crate::ModifiedKeys;
use crate::NodeKey;
use crate::OverlayConfig;
use crate::Result;
use crate::Subscription;

/// Identifier of one tree inside a [`TreeRegistry`]
pub type TreeId = String;

/// Lazily populated set of named trees plus one change stream per tree id.
///
/// Entries appear on first upsert and disappear once a delete empties the
/// tree. Subscriptions are keyed by tree id only, so they survive a tree
/// being dropped and created again.
pub struct TreeRegistry<K, V> {
    trees: DashMap<TreeId, Arc<ConcurrentTree<K, V>>>,
    fanout: ChangeFanout<TreeId, K>,
    config: OverlayConfig,
}

impl<K: NodeKey, V> std::fmt::Debug for TreeRegistry<K, V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TreeRegistry")
            .field("trees", &self.trees.len())
            .field("fanout", &self.fanout)
            .field("config", &self.config)
            .finish()
    }
}

impl<K: NodeKey, V: Send + Sync + 'static> Default for TreeRegistry<K, V> {
    fn default() -> Self {
        Self::from_valid_config(OverlayConfig::default())
    }
}

impl<K: NodeKey, V: Send + Sync + 'static> TreeRegistry<K, V> {
    /// Builds a registry after validating `config`.
    pub fn new(config: OverlayConfig) -> Result<Self> {
        let config = config.validate()?;
        info!(
            max_degree = config.tree.max_degree,
            subscriber_buffer_size = config.fanout.subscriber_buffer_size,
            "Tree registry created"
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: OverlayConfig) -> Self {
        Self {
            trees: DashMap::new(),
            fanout: ChangeFanout::new(config.fanout.clone()),
            config,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Returns the tree for `tree_id`, creating an empty one if absent.
    pub fn get_or_create(
        &self,
        tree_id: &str,
    ) -> Arc<ConcurrentTree<K, V>> {
        if let Some(tree) = self.trees.get(tree_id) {
            return Arc::clone(tree.value());
        }

        let entry = self.trees.entry(tree_id.to_string()).or_insert_with(|| {
            debug!(tree_id, "Creating tree");
            Arc::new(ConcurrentTree::with_config(&self.config.tree))
        });
        Arc::clone(entry.value())
    }

    pub fn get(
        &self,
        tree_id: &str,
    ) -> Option<Arc<ConcurrentTree<K, V>>> {
        self.trees.get(tree_id).map(|tree| Arc::clone(tree.value()))
    }

    /// Inserts or updates `key` in `tree_id` and notifies its subscribers.
    ///
    /// The registry map is only touched to find or create the tree; the
    /// mutation itself runs under that tree's write lock. If the tree was
    /// retired in between, the stale entry is discarded and the upsert is
    /// retried against a fresh tree.
    pub fn upsert(
        &self,
        tree_id: &str,
        key: K,
        value: V,
    ) -> ModifiedKeys<K> {
        let mut pending = (key, value);
        let modified = loop {
            let tree = self.get_or_create(tree_id);
            match tree.upsert_if_live(pending.0, pending.1) {
                Ok(modified) => break modified,
                Err(returned) => {
                    trace!(tree_id, "Tree retired during upsert, retrying");
                    self.trees.remove_if(tree_id, |_, current| Arc::ptr_eq(current, &tree));
                    pending = returned;
                }
            }
        };

        self.notify(tree_id, &modified);
        modified
    }

    /// Removes `key` from `tree_id` and notifies its subscribers. A tree left
    /// empty is dropped from the registry.
    ///
    /// Unknown trees and absent keys yield an empty set.
    pub fn delete(
        &self,
        tree_id: &str,
        key: &K,
    ) -> ModifiedKeys<K> {
        let Some(tree) = self.get(tree_id) else {
            return ModifiedKeys::new();
        };

        let (modified, retired) = tree.delete_and_retire_if_empty(key);
        if retired {
            self.trees.remove_if(tree_id, |_, current| Arc::ptr_eq(current, &tree));
            debug!(tree_id, "Empty tree removed from registry");
        }

        self.notify(tree_id, &modified);
        modified
    }

    pub fn find(
        &self,
        tree_id: &str,
        key: &K,
    ) -> Option<V>
    where
        V: Clone,
    {
        self.get(tree_id)?.find(key)
    }

    pub fn has(
        &self,
        tree_id: &str,
        key: &K,
    ) -> bool {
        self.get(tree_id).is_some_and(|tree| tree.has(key))
    }

    /// Full topology of `tree_id`; empty for unknown trees.
    pub fn adjacency_list(
        &self,
        tree_id: &str,
    ) -> AdjacencyList<K, V>
    where
        V: Clone,
    {
        self.get(tree_id)
            .map(|tree| tree.adjacency_list())
            .unwrap_or_default()
    }

    pub fn force_graph(
        &self,
        tree_id: &str,
    ) -> ForceGraph
    where
        K: Display,
        V: Clone,
    {
        ForceGraph::from(&self.adjacency_list(tree_id))
    }

    /// Value and neighbors of just `keys`, as a watcher would push them after
    /// a change event. Keys no longer present are left out.
    pub fn snapshot(
        &self,
        tree_id: &str,
        keys: &ModifiedKeys<K>,
    ) -> AdjacencyList<K, V>
    where
        V: Clone,
    {
        self.adjacency_list(tree_id).restrict(keys)
    }

    pub fn subscribe(
        &self,
        tree_id: &str,
    ) -> Subscription<TreeId, K> {
        self.fanout.subscribe(tree_id.to_string())
    }

    pub fn unsubscribe(
        &self,
        tree_id: &str,
        subscription_id: u64,
    ) -> bool {
        self.fanout.unsubscribe(&tree_id.to_string(), subscription_id)
    }

    pub fn subscriber_count(
        &self,
        tree_id: &str,
    ) -> usize {
        self.fanout.subscriber_count(&tree_id.to_string())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn contains_tree(
        &self,
        tree_id: &str,
    ) -> bool {
        self.trees.contains_key(tree_id)
    }

    pub fn tree_ids(&self) -> Vec<TreeId> {
        self.trees.iter().map(|entry| entry.key().clone()).collect()
    }

    fn notify(
        &self,
        tree_id: &str,
        modified: &ModifiedKeys<K>,
    ) {
        if modified.is_empty() {
            return;
        }
        self.fanout.emit(&tree_id.to_string(), modified.clone());
    }
}

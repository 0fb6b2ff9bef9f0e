use std::collections::HashMap;
use std::collections::HashSet;

use tracing::debug;
use tracing::trace;

use crate::AdjacencyList;
use crate::Graph;
use crate::ModifiedKeys;
use crate::NodeId;
use crate::NodeKey;
use crate::Traverse;
use crate::TreeConfig;
use crate::TreeError;

/// Bounded-degree, connected, acyclic overlay over a set of keyed nodes.
///
/// Between operations the graph reachable from `root` is a single tree in
/// which no node has more than `max_degree` neighbors. Keys carry no
/// ordering, so every lookup is a full walk.
#[derive(Debug, Clone)]
pub struct SpanningTree<K, V> {
    graph: Graph<K, V>,
    root: Option<NodeId>,
    max_degree: usize,
}

impl<K: NodeKey, V> SpanningTree<K, V> {
    /// # Panics
    /// If `max_degree < 2`.
    pub fn new(max_degree: usize) -> Self {
        assert!(
            max_degree >= 2,
            "max_degree must be at least 2, got {max_degree}"
        );
        Self {
            graph: Graph::new(),
            root: None,
            max_degree,
        }
    }

    pub fn with_config(config: &TreeConfig) -> Self {
        Self::new(config.max_degree)
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root_key(&self) -> Option<&K> {
        self.root.map(|id| self.graph.key(id))
    }

    /// Inserts `key` if absent, otherwise overwrites its value in place.
    ///
    /// A new key is attached to the first node with spare degree found by
    /// descending from the root into the branch with the nearest leaf.
    /// Returns the new key and its attachment point, or just `key` for an
    /// update or the first node.
    pub fn upsert(
        &mut self,
        key: K,
        value: V,
    ) -> ModifiedKeys<K> {
        let Some(root) = self.root else {
            let id = self.graph.insert(key.clone(), value);
            self.root = Some(id);
            trace!(?key, "Tree was empty, new node becomes root");
            return ModifiedKeys::from([key]);
        };

        if let Some(existing) = self.graph.find_by_key(root, &key) {
            *self.graph.value_mut(existing) = value;
            trace!(?key, "Value updated in place");
            return ModifiedKeys::from([key]);
        }

        let parent = self.attachment_point(root);
        let id = self.graph.insert(key.clone(), value);
        self.graph.link(parent, id);

        let parent_key = self.graph.key(parent).clone();
        trace!(?key, parent = ?parent_key, "Node attached");
        ModifiedKeys::from([parent_key, key])
    }

    /// Removes the node holding `key` and repairs the gap so the remaining
    /// nodes stay one tree.
    ///
    /// - a leaf is simply detached
    /// - a node with one child is replaced by that child
    /// - otherwise the leafiest node below it is detached and promoted into
    ///   its place, taking over all of its neighbors
    ///
    /// Returns every key on the path from the root to the removed node plus
    /// every key touched by the repair. Absent keys and empty trees yield an
    /// empty set.
    pub fn delete_by_key(
        &mut self,
        key: &K,
    ) -> ModifiedKeys<K> {
        let Some(root) = self.root else {
            return ModifiedKeys::new();
        };
        let Some(path) = self.graph.path_to_key(root, key) else {
            return ModifiedKeys::new();
        };

        let mut modified: ModifiedKeys<K> = path.iter().map(|id| self.graph.key(*id).clone()).collect();

        let target = path[path.len() - 1];
        let parent = path.len().checked_sub(2).map(|i| path[i]);
        let children: Vec<NodeId> = self
            .graph
            .neighbors(target)
            .iter()
            .copied()
            .filter(|n| Some(*n) != parent)
            .collect();

        let replacement = match children.as_slice() {
            [] => {
                let (_, cleaved) = self.graph.cleave(target);
                modified.extend(cleaved);
                None
            }
            [child] => {
                let child = *child;
                let (_, cleaved) = self.graph.cleave(target);
                modified.extend(cleaved);
                if let Some(parent) = parent {
                    self.graph.link(parent, child);
                }
                Some(child)
            }
            _ => {
                let blocked: HashSet<NodeId> = parent.into_iter().collect();
                let branch = self.graph.longest_path(target, &blocked);
                let leaf = branch[branch.len() - 1];
                let leaf_parent = branch[branch.len() - 2];
                debug_assert_eq!(self.graph.degree(leaf), 1, "promoted node must be a leaf");

                modified.insert(self.graph.key(leaf).clone());
                modified.insert(self.graph.key(leaf_parent).clone());
                self.graph.unlink(leaf, leaf_parent);

                let (neighbors, cleaved) = self.graph.cleave(target);
                modified.extend(cleaved);
                modified.extend(self.graph.interject(leaf, &neighbors));
                Some(leaf)
            }
        };

        self.graph.remove(target);
        if parent.is_none() {
            self.root = replacement;
        }

        debug!(
            ?key,
            replacement = ?replacement.map(|id| self.graph.key(id)),
            modified = modified.len(),
            "Node deleted"
        );
        modified
    }

    pub fn find(
        &self,
        key: &K,
    ) -> Option<&V> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn has(
        &self,
        key: &K,
    ) -> bool {
        self.find(key).is_some()
    }

    /// Lazy depth-first `(key, value)` pairs, starting at the root
    pub fn iter(&self) -> Traverse<'_, K, V> {
        self.graph.traverse(self.root, HashSet::new())
    }

    /// Cardinality, counted by walking the tree
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn adjacency_list(&self) -> AdjacencyList<K, V>
    where
        V: Clone,
    {
        self.graph.adjacency_list(self.root)
    }

    pub fn to_map(&self) -> HashMap<K, V>
    where
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Hop count of the longest root-to-leaf path; `None` when empty
    pub fn depth(&self) -> Option<usize> {
        self.root
            .map(|root| self.graph.longest_path(root, &HashSet::new()).len() - 1)
    }

    /// Verifies connectivity, acyclicity, edge symmetry, key uniqueness and
    /// the degree bound.
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        let Some(root) = self.root else {
            return match self.graph.len() {
                0 => Ok(()),
                nodes => Err(TreeError::OrphanedNodes { nodes }),
            };
        };

        let reached: Vec<NodeId> = self.graph.walk(root, HashSet::new()).collect();
        if reached.len() != self.graph.len() {
            return Err(TreeError::Disconnected {
                reachable: reached.len(),
                total: self.graph.len(),
            });
        }

        let mut seen: HashSet<&K> = HashSet::with_capacity(reached.len());
        let mut half_edges = 0;
        for id in &reached {
            let key = self.graph.key(*id);
            if !seen.insert(key) {
                return Err(TreeError::DuplicateKey {
                    key: format!("{key:?}"),
                });
            }

            let degree = self.graph.degree(*id);
            if degree > self.max_degree {
                return Err(TreeError::DegreeExceeded {
                    key: format!("{key:?}"),
                    degree,
                    max_degree: self.max_degree,
                });
            }

            for neighbor in self.graph.neighbors(*id) {
                if !self.graph.neighbors(*neighbor).contains(id) {
                    return Err(TreeError::AsymmetricEdge {
                        from: format!("{key:?}"),
                        to: format!("{:?}", self.graph.key(*neighbor)),
                    });
                }
            }
            half_edges += degree;
        }

        let edges = half_edges / 2;
        if edges + 1 != reached.len() {
            return Err(TreeError::Cycle {
                edges,
                nodes: reached.len(),
            });
        }

        Ok(())
    }

    /// Walks down from the root, always into the branch with the nearest
    /// leaf, until a node with spare degree turns up.
    ///
    /// Every suffix of the root's shortest path is itself the shortest path
    /// from that node away from its parent, so one walk covers every level.
    fn attachment_point(
        &self,
        root: NodeId,
    ) -> NodeId {
        let path = self.graph.shortest_path(root, &HashSet::new());
        match path.iter().copied().find(|id| self.graph.degree(*id) < self.max_degree) {
            Some(id) => id,
            None => panic!(
                "no node with spare degree on the shortest path from {:?}",
                self.graph.key(root)
            ),
        }
    }
}

use std::collections::BTreeSet;
use std::collections::HashMap;

use super::ModifiedKeys;
use super::Node;
use super::NodeId;
use super::NodeKey;

/// Arena of nodes connected by symmetric edges.
///
/// Every edge edit goes through [`Graph::link`] / [`Graph::unlink`], which keep
/// both endpoints' neighbor sets in agreement. Asking for an id the arena does
/// not hold, linking an existing edge or unlinking a missing one is a logic
/// fault and panics.
#[derive(Debug, Clone)]
pub struct Graph<K, V> {
    nodes: HashMap<NodeId, Node<K, V>>,
    next_id: u64,
}

impl<K, V> Default for Graph<K, V> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<K: NodeKey, V> Graph<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes held by the arena, reachable or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(
        &self,
        id: NodeId,
    ) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Adds a detached node and returns its id
    pub fn insert(
        &mut self,
        key: K,
        value: V,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(key, value));
        id
    }

    /// Drops a node from the arena. The node must already be cleaved.
    pub fn remove(
        &mut self,
        id: NodeId,
    ) -> Option<Node<K, V>> {
        if let Some(node) = self.nodes.get(&id) {
            assert!(
                node.is_isolated(),
                "node {:?} removed while still linked to {:?}",
                node.key,
                node.neighbors
            );
        }
        self.nodes.remove(&id)
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> Option<&Node<K, V>> {
        self.nodes.get(&id)
    }

    pub fn key(
        &self,
        id: NodeId,
    ) -> &K {
        &self.slot(id).key
    }

    pub fn value(
        &self,
        id: NodeId,
    ) -> &V {
        &self.slot(id).value
    }

    pub fn value_mut(
        &mut self,
        id: NodeId,
    ) -> &mut V {
        &mut self.slot_mut(id).value
    }

    pub fn neighbors(
        &self,
        id: NodeId,
    ) -> &BTreeSet<NodeId> {
        &self.slot(id).neighbors
    }

    pub fn degree(
        &self,
        id: NodeId,
    ) -> usize {
        self.slot(id).degree()
    }

    /// Keys of the node's neighbors
    pub fn neighbor_keys(
        &self,
        id: NodeId,
    ) -> BTreeSet<K> {
        self.neighbors(id).iter().map(|n| self.key(*n).clone()).collect()
    }

    /// Adds the undirected edge `a - b`
    pub fn link(
        &mut self,
        a: NodeId,
        b: NodeId,
    ) {
        assert_ne!(a, b, "node {:?} cannot neighbor itself", self.key(a));
        assert!(self.contains(b), "link target {b:?} is not in the graph");

        let added = self.slot_mut(a).neighbors.insert(b);
        assert!(added, "edge {a:?} - {b:?} already exists");
        self.slot_mut(b).neighbors.insert(a);
    }

    /// Removes the undirected edge `a - b`
    pub fn unlink(
        &mut self,
        a: NodeId,
        b: NodeId,
    ) {
        let removed = self.slot_mut(a).neighbors.remove(&b);
        assert!(removed, "{b:?} is not a neighbor of {a:?}");
        let reverse = self.slot_mut(b).neighbors.remove(&a);
        assert!(reverse, "edge {a:?} - {b:?} was one-sided");
    }

    /// Detaches the node from every neighbor.
    ///
    /// Returns the former neighbors and the keys of every node touched: the
    /// cleaved node itself plus each former neighbor.
    pub fn cleave(
        &mut self,
        id: NodeId,
    ) -> (Vec<NodeId>, ModifiedKeys<K>) {
        let neighbors: Vec<NodeId> = self.neighbors(id).iter().copied().collect();

        let mut modified = ModifiedKeys::new();
        modified.insert(self.key(id).clone());

        for neighbor in &neighbors {
            modified.insert(self.key(*neighbor).clone());
            self.unlink(id, *neighbor);
        }

        (neighbors, modified)
    }

    /// Attaches each of `neighbors`, previously disjoint from `id`, as a
    /// neighbor of `id`.
    pub fn interject(
        &mut self,
        id: NodeId,
        neighbors: &[NodeId],
    ) -> ModifiedKeys<K> {
        let mut modified = ModifiedKeys::new();
        modified.insert(self.key(id).clone());

        for neighbor in neighbors {
            modified.insert(self.key(*neighbor).clone());
            self.link(id, *neighbor);
        }

        modified
    }

    /// Ids of every node in the arena, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    fn slot(
        &self,
        id: NodeId,
    ) -> &Node<K, V> {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("node {id:?} is not in the graph"))
    }

    fn slot_mut(
        &mut self,
        id: NodeId,
    ) -> &mut Node<K, V> {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("node {id:?} is not in the graph"))
    }
}

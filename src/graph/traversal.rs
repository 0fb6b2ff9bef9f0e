//! Depth-first walks over a [`Graph`].
//!
//! Every walk tracks visited ids, so it terminates on any graph and never
//! yields a node twice. Walks are synchronous and lazy: nothing is computed
//! beyond what the caller pulls.

use std::collections::HashMap;
use std::collections::HashSet;

use super::Graph;
use super::NodeId;
use super::NodeKey;
use crate::AdjacencyEntry;
use crate::AdjacencyList;

/// Lazy depth-first sequence of node ids reachable from a start node.
///
/// Finite and non-restartable; neighbors are explored in id order.
pub struct Walk<'a, K, V> {
    graph: &'a Graph<K, V>,
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'a, K: NodeKey, V> Walk<'a, K, V> {
    pub(crate) fn new(
        graph: &'a Graph<K, V>,
        from: Option<NodeId>,
        mut visited: HashSet<NodeId>,
    ) -> Self {
        let mut stack = Vec::new();
        if let Some(from) = from {
            if visited.insert(from) {
                stack.push(from);
            }
        }
        Self {
            graph,
            stack,
            visited,
        }
    }
}

impl<K: NodeKey, V> Iterator for Walk<'_, K, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Reverse so the lowest id is popped first
        for neighbor in self.graph.neighbors(current).iter().rev() {
            if self.visited.insert(*neighbor) {
                self.stack.push(*neighbor);
            }
        }

        Some(current)
    }
}

/// Lazy depth-first sequence of `(key, value)` pairs; see [`Walk`].
pub struct Traverse<'a, K, V> {
    walk: Walk<'a, K, V>,
}

impl<'a, K: NodeKey, V> Iterator for Traverse<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.walk.next()?;
        let graph: &'a Graph<K, V> = self.walk.graph;
        let node = graph.node(id)?;
        Some((&node.key, &node.value))
    }
}

impl<K: NodeKey, V> Graph<K, V> {
    /// Ids reachable from `from`, skipping anything already in `visited`
    pub fn walk(
        &self,
        from: NodeId,
        visited: HashSet<NodeId>,
    ) -> Walk<'_, K, V> {
        Walk::new(self, Some(from), visited)
    }

    /// Key/value pairs reachable from `from`, skipping anything already in
    /// `visited`. `None` yields an empty sequence.
    pub fn traverse(
        &self,
        from: Option<NodeId>,
        visited: HashSet<NodeId>,
    ) -> Traverse<'_, K, V> {
        Traverse {
            walk: Walk::new(self, from, visited),
        }
    }

    /// Id of the node holding `key`. O(size): nodes carry no key ordering.
    pub fn find_by_key(
        &self,
        from: NodeId,
        key: &K,
    ) -> Option<NodeId> {
        self.walk(from, HashSet::new()).find(|id| self.key(*id) == key)
    }

    /// Ordered ids from `from` down to the node holding `key`, both inclusive
    pub fn path_to_key(
        &self,
        from: NodeId,
        key: &K,
    ) -> Option<Vec<NodeId>> {
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        let mut stack = vec![from];
        let mut visited = HashSet::from([from]);

        while let Some(current) = stack.pop() {
            if self.key(current) == key {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(parent) = parents.get(&cursor) {
                    path.push(*parent);
                    cursor = *parent;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in self.neighbors(current) {
                if visited.insert(*neighbor) {
                    parents.insert(*neighbor, current);
                    stack.push(*neighbor);
                }
            }
        }

        None
    }

    /// Path from `from` to the nearest leaf, descending through whichever
    /// unvisited neighbor yields the fewest nodes. A node with no unvisited
    /// neighbors returns `[from]`.
    pub fn shortest_path(
        &self,
        from: NodeId,
        visited: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        self.select_path(from, visited, PathChoice::Shortest)
    }

    /// Path from `from` to the farthest leaf; same shape as
    /// [`Graph::shortest_path`].
    pub fn longest_path(
        &self,
        from: NodeId,
        visited: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        self.select_path(from, visited, PathChoice::Longest)
    }

    /// The node at the end of the longest path: the one whose removal
    /// disturbs the fewest other nodes.
    pub fn leafiest(
        &self,
        from: NodeId,
        visited: &HashSet<NodeId>,
    ) -> NodeId {
        let path = self.longest_path(from, visited);
        path.last().copied().unwrap_or(from)
    }

    /// Builds `key -> (value, neighbor keys)` for every node reachable from
    /// `from`.
    pub fn adjacency_list(
        &self,
        from: Option<NodeId>,
    ) -> AdjacencyList<K, V>
    where
        V: Clone,
    {
        let mut list = AdjacencyList::new();
        let Some(from) = from else {
            return list;
        };

        for id in self.walk(from, HashSet::new()) {
            list.insert(
                self.key(id).clone(),
                AdjacencyEntry {
                    value: self.value(id).clone(),
                    neighbors: self.neighbor_keys(id),
                },
            );
        }

        list
    }

    /// Depth-first search with an explicit stack. Each finished node reports
    /// its path length to its parent, which keeps the preferred child as the
    /// next hop; the winning path is assembled once at the end.
    fn select_path(
        &self,
        from: NodeId,
        visited: &HashSet<NodeId>,
        choice: PathChoice,
    ) -> Vec<NodeId> {
        let mut seen = visited.clone();
        seen.insert(from);

        let mut next_hop: HashMap<NodeId, NodeId> = HashMap::new();
        let mut frames = vec![PathFrame::new(from, self.unvisited_neighbors(from, &seen))];

        loop {
            let Some(frame) = frames.last_mut() else {
                break;
            };

            if let Some(child) = frame.pending.pop() {
                // Only reachable twice if the graph is not a tree
                if seen.insert(child) {
                    let pending = self.unvisited_neighbors(child, &seen);
                    frames.push(PathFrame::new(child, pending));
                }
                continue;
            }

            let Some(done) = frames.pop() else {
                break;
            };
            let length = 1 + done.best.map_or(0, |(length, _)| length);
            if let Some((_, hop)) = done.best {
                next_hop.insert(done.node, hop);
            }

            if let Some(parent) = frames.last_mut() {
                let replace = match parent.best {
                    None => true,
                    Some((current, _)) => choice.prefers(length, current),
                };
                if replace {
                    parent.best = Some((length, done.node));
                }
            }
        }

        let mut path = vec![from];
        let mut cursor = from;
        while let Some(next) = next_hop.get(&cursor) {
            path.push(*next);
            cursor = *next;
        }
        path
    }

    /// Neighbors not yet in `seen`, highest id first so popping yields id order
    fn unvisited_neighbors(
        &self,
        id: NodeId,
        seen: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        self.neighbors(id)
            .iter()
            .rev()
            .copied()
            .filter(|n| !seen.contains(n))
            .collect()
    }
}

struct PathFrame {
    node: NodeId,
    pending: Vec<NodeId>,
    /// Length in nodes of the preferred branch so far and its first hop
    best: Option<(usize, NodeId)>,
}

impl PathFrame {
    fn new(
        node: NodeId,
        pending: Vec<NodeId>,
    ) -> Self {
        Self {
            node,
            pending,
            best: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PathChoice {
    Shortest,
    Longest,
}

impl PathChoice {
    /// Ties keep the earlier branch
    fn prefers(
        self,
        candidate: usize,
        current: usize,
    ) -> bool {
        match self {
            PathChoice::Shortest => candidate < current,
            PathChoice::Longest => candidate > current,
        }
    }
}

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::NodeKey;
use crate::Result;

/// One node of an [`AdjacencyList`]: its payload and the keys it links to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyEntry<K: Ord, V> {
    pub value: V,
    pub neighbors: BTreeSet<K>,
}

/// Mapping of every node key to its value and neighbor keys.
///
/// Serializes as `{ "<key>": { "value": ..., "neighbors": [...] } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyList<K: Ord, V> {
    entries: BTreeMap<K, AdjacencyEntry<K, V>>,
}

impl<K: Ord, V> Default for AdjacencyList<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: NodeKey, V> AdjacencyList<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: K,
        entry: AdjacencyEntry<K, V>,
    ) -> Option<AdjacencyEntry<K, V>> {
        self.entries.insert(key, entry)
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<&AdjacencyEntry<K, V>> {
        self.entries.get(key)
    }

    pub fn contains_key(
        &self,
        key: &K,
    ) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, AdjacencyEntry<K, V>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> BTreeSet<K> {
        self.entries.keys().cloned().collect()
    }

    /// Number of undirected edges, counting each `a - b` once
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(|e| e.neighbors.len()).sum::<usize>() / 2
    }

    /// True when every listed edge has its reverse listed too
    pub fn is_symmetric(&self) -> bool {
        self.entries.iter().all(|(key, entry)| {
            entry.neighbors.iter().all(|n| {
                self.entries
                    .get(n)
                    .map(|other| other.neighbors.contains(key))
                    .unwrap_or(false)
            })
        })
    }

    /// Same keys, each with the same neighbor set. Values are ignored.
    pub fn same_topology(
        &self,
        other: &Self,
    ) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, entry)| {
                other
                    .entries
                    .get(key)
                    .map(|o| o.neighbors == entry.neighbors)
                    .unwrap_or(false)
            })
    }

    /// Keys in depth-first order from `start`, following listed neighbors
    pub fn walk_keys(
        &self,
        start: &K,
    ) -> Vec<K> {
        let mut order = Vec::new();
        if !self.entries.contains_key(start) {
            return order;
        }

        let mut visited: HashSet<K> = HashSet::from([start.clone()]);
        let mut stack = vec![start.clone()];
        while let Some(key) = stack.pop() {
            if let Some(entry) = self.entries.get(&key) {
                for neighbor in entry.neighbors.iter().rev() {
                    if self.entries.contains_key(neighbor) && visited.insert(neighbor.clone()) {
                        stack.push(neighbor.clone());
                    }
                }
            }
            order.push(key);
        }

        order
    }

    pub fn to_json(&self) -> Result<String>
    where
        K: Serialize,
        V: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }
}

impl<K: NodeKey, V: Clone> AdjacencyList<K, V> {
    /// Merges both lists; neighbor sets are unioned and the first value seen
    /// for a key wins.
    pub fn union(
        &self,
        other: &Self,
    ) -> Self {
        let mut merged = self.clone();
        for (key, entry) in &other.entries {
            merged.add_links(key.clone(), entry.neighbors.clone(), entry.value.clone());
        }
        merged
    }

    /// The same graph with every edge pointing the other way. Each new entry
    /// takes the value of the node that originally pointed at it.
    pub fn reversed(&self) -> Self {
        let mut reversed = Self::new();
        for (key, entry) in &self.entries {
            for link in &entry.neighbors {
                reversed.add_links(link.clone(), BTreeSet::from([key.clone()]), entry.value.clone());
            }
        }
        reversed
    }

    /// Only the entries whose key is in `keys`
    pub fn restrict(
        &self,
        keys: &BTreeSet<K>,
    ) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keys.contains(*k))
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect(),
        }
    }

    fn add_links(
        &mut self,
        key: K,
        links: BTreeSet<K>,
        default_value: V,
    ) {
        match self.entries.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(AdjacencyEntry {
                    value: default_value,
                    neighbors: links,
                });
            }
            btree_map::Entry::Occupied(mut slot) => {
                slot.get_mut().neighbors.extend(links);
            }
        }
    }
}

impl<K: Ord, V> IntoIterator for AdjacencyList<K, V> {
    type Item = (K, AdjacencyEntry<K, V>);
    type IntoIter = btree_map::IntoIter<K, AdjacencyEntry<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AdjacencyList<K, V> {
    type Item = (&'a K, &'a AdjacencyEntry<K, V>);
    type IntoIter = btree_map::Iter<'a, K, AdjacencyEntry<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, AdjacencyEntry<K, V>)> for AdjacencyList<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, AdjacencyEntry<K, V>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use super::AdjacencyList;
use crate::NodeKey;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceGraphNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceGraphLink {
    pub source: String,
    pub target: String,
}

/// Rendering shape for force-directed graph viewers:
/// `{ "nodes": [{ "id" }], "links": [{ "source", "target" }] }`.
///
/// Every undirected edge shows up twice, once per direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceGraph {
    pub nodes: Vec<ForceGraphNode>,
    pub links: Vec<ForceGraphLink>,
}

impl ForceGraph {
    pub fn from_adjacency<K, V>(list: &AdjacencyList<K, V>) -> Self
    where
        K: NodeKey + Display,
    {
        let mut graph = ForceGraph::default();

        for (key, entry) in list {
            let source = key.to_string();
            for neighbor in &entry.neighbors {
                graph.links.push(ForceGraphLink {
                    source: source.clone(),
                    target: neighbor.to_string(),
                });
            }
            graph.nodes.push(ForceGraphNode { id: source });
        }

        graph
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<K, V> From<&AdjacencyList<K, V>> for ForceGraph
where
    K: NodeKey + Display,
{
    fn from(list: &AdjacencyList<K, V>) -> Self {
        Self::from_adjacency(list)
    }
}

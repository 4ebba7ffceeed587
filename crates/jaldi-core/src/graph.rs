//! The graph submitted by the editor: ordered nodes plus the edges the user
//! drew between them.
//!
//! Nothing here enforces referential integrity. Edges may point at ids that
//! do not exist and node ids may repeat; [`Graph::duplicate_node_ids`] and
//! [`Graph::dangling_edges`] only report such cases.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};
use crate::node::Node;

/// Rendering hint used when an edge does not name one.
pub const DEFAULT_EDGE_TYPE: &str = "smoothstep";

fn default_edge_type() -> String {
    DEFAULT_EDGE_TYPE.to_string()
}

/// A connection drawn between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// How the canvas draws the edge. Carries no semantics.
    #[serde(rename = "type", default = "default_edge_type")]
    pub edge_type: String,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: default_edge_type(),
        }
    }
}

/// The full state of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// First node with the given id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// Edges touching the given node, in insertion order.
    pub fn edges_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |e| &e.source == id || &e.target == id)
    }

    /// Node ids that occur more than once, each reported once.
    pub fn duplicate_node_ids(&self) -> Vec<&NodeId> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.nodes
            .iter()
            .map(|n| &n.id)
            .filter(|id| !seen.insert(*id) && reported.insert(*id))
            .collect()
    }

    /// Edges whose source or target is not a node of this graph.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let ids: HashSet<&NodeId> = self.nodes.iter().map(|n| &n.id).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(&e.source) || !ids.contains(&e.target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Graph {
        serde_json::from_value(json!({
            "nodes": [
                { "id": "page-1", "type": "pageNode", "position": { "x": 0, "y": 0 }, "data": {} },
                { "id": "ui-2", "type": "inputElement", "position": { "x": 5, "y": 5 }, "data": {} },
                { "id": "ui-2", "type": "buttonElement", "position": { "x": 9, "y": 9 }, "data": {} }
            ],
            "edges": [
                { "id": "edge-1", "source": "page-1", "target": "ui-2" },
                { "id": "edge-2", "source": "ui-2", "target": "api-9", "type": "default" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let graph: Graph = serde_json::from_value(json!({})).unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn edge_type_defaults_to_smoothstep() {
        let graph = sample();
        assert_eq!(graph.edges[0].edge_type, DEFAULT_EDGE_TYPE);
        assert_eq!(graph.edges[1].edge_type, "default");
    }

    #[test]
    fn reports_duplicates_and_dangling_edges() {
        let graph = sample();
        assert_eq!(graph.duplicate_node_ids(), vec![&NodeId::from("ui-2")]);
        let dangling: Vec<&str> = graph.dangling_edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(dangling, ["edge-2"]);
    }

    #[test]
    fn lookup_returns_first_match() {
        let graph = sample();
        let node = graph.node(&NodeId::from("ui-2")).unwrap();
        assert_eq!(node.kind().tag(), "inputElement");
        assert_eq!(graph.edges_of(&NodeId::from("ui-2")).count(), 2);
    }
}

//! Identifier newtypes for graph entities.
//!
//! Ids are strings on the wire (the canvas library assigns them), wrapped in
//! distinct newtypes so a `NodeId` cannot be used where an `EdgeId` is
//! expected. [`IdAllocator`] hands out fresh ids for editor-created entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier, unique within one graph submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Edge identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl NodeId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EdgeId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        EdgeId(s)
    }
}

/// Monotonic allocator for editor-created ids.
///
/// Node ids take the form `<prefix>-<n>` where `n` is shared across all
/// prefixes, so `page-1` and `ui-1` can never both be handed out. Edge ids
/// take the form `edge-<n>`.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next_node: u64,
    next_edge: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh node id with the given prefix.
    pub fn node_id(&mut self, prefix: &str) -> NodeId {
        self.next_node += 1;
        NodeId(format!("{}-{}", prefix, self.next_node))
    }

    /// Allocates a fresh edge id.
    pub fn edge_id(&mut self) -> EdgeId {
        self.next_edge += 1;
        EdgeId(format!("edge-{}", self.next_edge))
    }

    /// Advances the node counter past an existing id's numeric suffix.
    pub fn observe_node(&mut self, id: &NodeId) {
        if let Some(n) = numeric_suffix(id.as_str()) {
            self.next_node = self.next_node.max(n);
        }
    }

    /// Advances the edge counter past an existing id's numeric suffix.
    pub fn observe_edge(&mut self, id: &EdgeId) {
        if let Some(n) = numeric_suffix(id.as_str()) {
            self.next_edge = self.next_edge.max(n);
        }
    }
}

fn numeric_suffix(id: &str) -> Option<u64> {
    id.rsplit('-').next().and_then(|tail| tail.parse().ok())
}

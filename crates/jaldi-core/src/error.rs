//! Core error types for jaldi-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of node construction and editor mutations.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// Core errors produced by the jaldi-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: '{id}'")]
    NodeNotFound { id: NodeId },

    /// An edge id was not found in the graph.
    #[error("edge not found: '{id}'")]
    EdgeNotFound { id: EdgeId },

    /// A node's data did not match the schema of its kind.
    #[error("invalid data for node '{id}' ({kind}): {reason}")]
    InvalidNodeData {
        id: NodeId,
        kind: String,
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid_data(id: &NodeId, kind: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidNodeData {
            id: id.clone(),
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

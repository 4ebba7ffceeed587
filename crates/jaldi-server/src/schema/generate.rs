//! Request/response types for `POST /generate`.

use jaldi_core::{GenerationStats, Graph};
use serde::{Deserialize, Serialize};

/// Request body: the editor's whole graph.
pub type GenerateRequest = Graph;

/// Response body for a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Always `true`; failures use the error envelope instead.
    pub success: bool,
    pub message: String,
    /// Where the report was written, as configured on the server.
    pub file_path: String,
    pub stats: GenerationStats,
}

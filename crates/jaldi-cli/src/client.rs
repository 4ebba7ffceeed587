//! HTTP client for a running generator server.

use jaldi_core::{GenerationStats, Graph};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Body of a successful `POST /generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    pub stats: GenerationStats,
}

pub struct GenerateClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GenerateClient {
    /// `server_url` is the base URL, e.g. `http://localhost:3001`.
    pub fn new(server_url: &str) -> Self {
        GenerateClient {
            http: reqwest::Client::new(),
            endpoint: format!("{}/generate", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(&self, graph: &Graph) -> Result<SubmitReceipt, ClientError> {
        let response = self.http.post(&self.endpoint).json(graph).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

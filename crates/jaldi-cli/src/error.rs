//! Error types for the CLI's operational commands.

use std::path::PathBuf;

/// Failures of the audit and hook commands that abort the command.
///
/// Individual workspace or hook problems are logged as warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// A report, log or hook file could not be written.
    #[error("failed to write {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audit report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl OpsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OpsError::Io {
            path: path.into(),
            source,
        }
    }
}

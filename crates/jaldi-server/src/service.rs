//! Report generation service.
//!
//! [`GenerationService`] renders a report for each submitted graph and
//! overwrites the report file with it. Writes are serialized through an
//! async mutex so two concurrent requests cannot interleave file contents;
//! whichever finishes last wins.

use std::path::PathBuf;

use chrono::Utc;
use jaldi_core::Graph;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::schema::generate::GenerateResponse;

/// Stateless apart from the report file it owns.
pub struct GenerationService {
    report_path: PathBuf,
    write_lock: Mutex<()>,
}

impl GenerationService {
    pub fn new(report_path: PathBuf) -> Self {
        GenerationService {
            report_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Renders the report for `graph`, writes it and returns the stats.
    pub async fn generate(&self, graph: &Graph) -> Result<GenerateResponse, ApiError> {
        let report = jaldi_core::generate(graph, Utc::now());
        self.write_report(&report.text).await?;

        tracing::info!(
            path = %self.report_path.display(),
            nodes = report.stats.total_elements,
            edges = report.stats.connections,
            "report written"
        );

        Ok(GenerateResponse {
            success: true,
            message: "Website report generated successfully".to_string(),
            file_path: self.report_path.display().to_string(),
            stats: report.stats,
        })
    }

    async fn write_report(&self, text: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self
            .report_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.report_path, text).await
    }
}

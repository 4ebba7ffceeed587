//! HTTP service that turns a submitted builder graph into a report.
//!
//! Provides `POST /generate`: the editor sends its whole graph, the service
//! renders the report and inferred SQL schema with [`jaldi_core::generate`],
//! overwrites the report file and answers with summary statistics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod service;
pub mod state;

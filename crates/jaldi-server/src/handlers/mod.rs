//! HTTP handler modules for the generator API.
//!
//! Handlers parse requests, delegate to [`crate::service::GenerationService`]
//! and return JSON responses. No report logic lives in handlers.

pub mod generate;

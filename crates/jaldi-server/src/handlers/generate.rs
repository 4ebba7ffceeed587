//! Report generation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::schema::generate::{GenerateRequest, GenerateResponse};
use crate::state::AppState;

/// Renders and stores the report for the submitted graph.
///
/// `POST /generate`
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(graph) = payload?;
    let response = state.service.generate(&graph).await?;
    Ok(Json(response))
}

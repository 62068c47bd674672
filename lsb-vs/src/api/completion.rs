//! Completion status endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use lsb_common::CompletionStatus;

use crate::api::ApiError;
use crate::completion;
use crate::AppState;

/// Review progress for one (match, reviewer) pair
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub match_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: CompletionStatus,
    /// Display form, e.g. "3/6"
    pub progress: String,
}

/// GET /api/matches/:match_id/completion/:reviewer_id
pub async fn get_completion_status(
    State(state): State<AppState>,
    Path((match_id, reviewer_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let report = completion::completion_status(&state.db, match_id, reviewer_id).await?;

    Ok(Json(CompletionResponse {
        match_id,
        reviewer_id,
        status: report.status,
        progress: report.progress,
    }))
}

//! Aggregated score endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{self, PlayerDivisionScores};
use crate::api::ApiError;
use crate::AppState;

/// GET /api/players/:player_id/scores/:division_code
///
/// Always a fresh, pure recomputation from the ledger; an unscored pair is
/// reported as such rather than as a row of neutral numbers.
pub async fn get_attribute_scores(
    State(state): State<AppState>,
    Path((player_id, division_code)): Path<(Uuid, String)>,
) -> Result<Json<PlayerDivisionScores>, ApiError> {
    let scores =
        aggregate::get_attribute_scores(&state.db, &state.scoring, player_id, &division_code)
            .await?;
    Ok(Json(scores))
}

/// Divisions with contributing votes, busiest first
#[derive(Debug, Serialize)]
pub struct DivisionsResponse {
    pub player_id: Uuid,
    pub divisions: Vec<String>,
}

/// GET /api/players/:player_id/divisions
pub async fn list_divisions(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<DivisionsResponse>, ApiError> {
    let divisions = aggregate::list_available_divisions(&state.db, player_id).await?;
    Ok(Json(DivisionsResponse { player_id, divisions }))
}

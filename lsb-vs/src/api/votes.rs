//! Vote submission and ledger audit endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lsb_common::db::models::{parse_guid, VoteRecord};
use lsb_common::Attribute;

use crate::api::ApiError;
use crate::ingest::{SubmitRequest, VoteIngestor};
use crate::AppState;

/// Request body for POST /api/votes
///
/// Attribute keys outside the closed six fail deserialization; values are
/// raw integers so one bad entry can be rejected without failing the batch.
#[derive(Debug, Deserialize)]
pub struct SubmitVotesRequest {
    pub reviewer_token: String,
    pub match_id: Uuid,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub values: BTreeMap<Attribute, i64>,
}

/// Per-batch ingestion report
#[derive(Debug, Serialize)]
pub struct SubmitVotesResponse {
    pub accepted: usize,
    pub skipped: Vec<Attribute>,
    pub invalid: Vec<Attribute>,
    pub all_duplicate: bool,
}

/// POST /api/votes
///
/// Submits one batch of comparative votes for a match. Duplicates and
/// invalid values are reported per attribute in the response body.
pub async fn submit_votes(
    State(state): State<AppState>,
    Json(req): Json<SubmitVotesRequest>,
) -> Result<Json<SubmitVotesResponse>, ApiError> {
    let ingestor = VoteIngestor::new(
        state.db.clone(),
        state.registry.clone(),
        state.catalog.clone(),
        state.cache.clone(),
    );

    let outcome = ingestor
        .submit_votes(SubmitRequest {
            reviewer_token: req.reviewer_token,
            match_id: req.match_id,
            player1_id: req.player1_id,
            player2_id: req.player2_id,
            values: req.values,
        })
        .await?;

    Ok(Json(SubmitVotesResponse {
        accepted: outcome.accepted,
        skipped: outcome.skipped,
        invalid: outcome.invalid,
        all_duplicate: outcome.all_duplicate,
    }))
}

/// Recorded votes for one match
#[derive(Debug, Serialize)]
pub struct MatchVotesResponse {
    pub match_id: Uuid,
    pub votes: Vec<VoteRecord>,
}

/// GET /api/matches/:match_id/votes
///
/// Audit read over the append-only ledger, in append order.
pub async fn list_match_votes(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchVotesResponse>, ApiError> {
    // 404 for ids the catalog has never seen
    state.catalog.lookup(match_id).await?;

    let rows: Vec<(String, String, i64, String, String, String)> = sqlx::query_as(
        "SELECT reviewer_id, attribute, value, player1_id, player2_id, created_at \
         FROM votes WHERE match_id = ? ORDER BY id ASC",
    )
    .bind(match_id.to_string())
    .fetch_all(&state.db)
    .await
    .map_err(lsb_common::Error::from)?;

    let mut votes = Vec::with_capacity(rows.len());
    for (reviewer_id, attribute, value, player1_id, player2_id, created_at) in rows {
        votes.push(VoteRecord {
            match_id,
            reviewer_id: parse_guid("reviewer", &reviewer_id)?,
            attribute,
            value,
            player1_id: parse_guid("player1", &player1_id)?,
            player2_id: parse_guid("player2", &player2_id)?,
            created_at,
        });
    }

    Ok(Json(MatchVotesResponse { match_id, votes }))
}

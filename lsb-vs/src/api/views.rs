//! Cached derived-view endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use lsb_common::Error;

use crate::api::ApiError;
use crate::cache::Freshness;
use crate::views::{is_known_view, LeagueViews};
use crate::AppState;

/// Served view snapshot
#[derive(Debug, Serialize)]
pub struct CachedViewResponse {
    pub key: String,
    pub freshness: Freshness,
    pub payload: serde_json::Value,
}

/// GET /api/views/:key
///
/// Serves a derived view through the TTL cache; an unreachable source is
/// invisible to the caller whenever a stale snapshot can substitute.
pub async fn get_cached_view(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CachedViewResponse>, ApiError> {
    if !is_known_view(&key) {
        return Err(ApiError(Error::NotFound(format!("Unknown view key: {}", key))));
    }

    let source = LeagueViews::new(state.db.clone());
    let view = state.cache.get(&key, &source).await?;

    Ok(Json(CachedViewResponse {
        key,
        freshness: view.freshness,
        payload: view.payload,
    }))
}

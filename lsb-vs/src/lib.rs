//! lsb-vs library - Vote Service module
//!
//! Ingests pairwise comparative judgments, tracks per-reviewer completion,
//! aggregates weighted attribute scores, and serves derived views through a
//! TTL cache with stale fallback.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

use lsb_common::params::ScoringParams;

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod completion;
pub mod ingest;
pub mod registry;
pub mod views;

use cache::ViewCache;
use catalog::MatchCatalog;
use registry::ReviewerRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (ledger, catalog tables, cache snapshots)
    pub db: SqlitePool,
    /// Reviewer Registry collaborator (token resolution)
    pub registry: Arc<dyn ReviewerRegistry>,
    /// Match Catalog collaborator (canonical match facts)
    pub catalog: Arc<dyn MatchCatalog>,
    /// Scoring policy loaded from settings at startup
    pub scoring: ScoringParams,
    /// Derived-view cache
    pub cache: ViewCache,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        registry: Arc<dyn ReviewerRegistry>,
        catalog: Arc<dyn MatchCatalog>,
        scoring: ScoringParams,
        cache: ViewCache,
    ) -> Self {
        Self { db, registry, catalog, scoring, cache }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/votes", post(api::submit_votes))
        .route("/api/matches/:match_id/votes", get(api::list_match_votes))
        .route(
            "/api/matches/:match_id/completion/:reviewer_id",
            get(api::get_completion_status),
        )
        .route(
            "/api/players/:player_id/scores/:division_code",
            get(api::get_attribute_scores),
        )
        .route("/api/players/:player_id/divisions", get(api::list_divisions))
        .route("/api/views/:key", get(api::get_cached_view))
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

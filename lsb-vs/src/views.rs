//! Authoritative builders for the cached derived views
//!
//! These are the expensive read-mostly aggregates served through the
//! derived-view cache. They are built from catalog data, not from votes.

use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;

use lsb_common::{Error, Result};

use crate::cache::ViewSource;

/// Per-division match listing ordered by play date
pub const SEASON_SCHEDULE: &str = "season-schedule";
/// Shared-match adjacency graph over players
pub const PLAYER_NETWORK: &str = "player-network";

/// Whether a key names a servable derived view
pub fn is_known_view(key: &str) -> bool {
    matches!(key, SEASON_SCHEDULE | PLAYER_NETWORK)
}

/// Database-backed view source for the league's derived views
pub struct LeagueViews {
    pool: SqlitePool,
}

impl LeagueViews {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn season_schedule(&self) -> Result<serde_json::Value> {
        let rows: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT guid, division_code, player1_id, player2_id, played_at
            FROM matches
            ORDER BY division_code ASC, played_at ASC, guid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let entries: Vec<serde_json::Value> = rows
            .into_iter()
            .map(|(guid, division, player1, player2, played_at)| {
                json!({
                    "match_id": guid,
                    "division_code": division,
                    "player1_id": player1,
                    "player2_id": player2,
                    "played_at": played_at,
                })
            })
            .collect();

        Ok(json!({ "matches": entries }))
    }

    async fn player_network(&self) -> Result<serde_json::Value> {
        let nodes: Vec<(String, String)> =
            sqlx::query_as("SELECT guid, handle FROM players ORDER BY handle ASC, guid ASC")
                .fetch_all(&self.pool)
                .await?;

        let edges: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT player1_id, player2_id, COUNT(*) AS shared_matches
            FROM matches
            GROUP BY player1_id, player2_id
            ORDER BY shared_matches DESC, player1_id ASC, player2_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(json!({
            "nodes": nodes
                .into_iter()
                .map(|(guid, handle)| json!({ "player_id": guid, "handle": handle }))
                .collect::<Vec<_>>(),
            "edges": edges
                .into_iter()
                .map(|(a, b, n)| json!({ "player1_id": a, "player2_id": b, "shared_matches": n }))
                .collect::<Vec<_>>(),
        }))
    }
}

#[async_trait]
impl ViewSource for LeagueViews {
    async fn fetch(&self, key: &str) -> Result<serde_json::Value> {
        match key {
            SEASON_SCHEDULE => self.season_schedule().await,
            PLAYER_NETWORK => self.player_network().await,
            other => Err(Error::NotFound(format!("Unknown view key: {}", other))),
        }
    }
}

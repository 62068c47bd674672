//! Derived-view cache
//!
//! TTL-bounded snapshot cache for expensive read-mostly views, backed by
//! the view_cache table: one serialized JSON blob per logical key with its
//! creation time embedded. Refreshes happen synchronously on miss/expiry
//! within the triggering request; an expired snapshot is kept and served as
//! stale fallback while the authoritative source is unreachable.
//!
//! No cross-request coordination: concurrent refreshes of one key may both
//! hit the source, and the final write wins.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use lsb_common::params::get_setting_i64;
use lsb_common::{Error, Result};

/// Default snapshot lifetime when the settings knob is absent
const DEFAULT_TTL_SECONDS: u64 = 900;

/// Whether a served payload is current or an expired fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Freshness {
    Fresh,
    StaleFallback,
}

/// A served snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CachedView {
    pub payload: serde_json::Value,
    pub freshness: Freshness,
}

/// Authoritative source for a derived view
#[async_trait]
pub trait ViewSource: Send + Sync {
    /// Build the current payload for a key
    async fn fetch(&self, key: &str) -> Result<serde_json::Value>;
}

/// Read-through snapshot cache over the view_cache table
#[derive(Clone)]
pub struct ViewCache {
    pool: SqlitePool,
    ttl: Duration,
}

impl ViewCache {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Read the TTL knob from settings
    pub async fn load_ttl(pool: &SqlitePool) -> Result<Duration> {
        let seconds = get_setting_i64(pool, "view_cache_ttl_seconds")
            .await?
            .filter(|s| *s >= 0)
            .map(|s| s as u64)
            .unwrap_or(DEFAULT_TTL_SECONDS);
        Ok(Duration::from_secs(seconds))
    }

    /// Serve a view, refreshing from the source when the snapshot is
    /// missing or expired
    ///
    /// On refresh failure any existing snapshot (even expired) is served as
    /// `stale-fallback`; with no snapshot at all the failure surfaces as
    /// [`Error::SourceUnavailable`].
    pub async fn get(&self, key: &str, source: &dyn ViewSource) -> Result<CachedView> {
        let snapshot: Option<(String, i64)> =
            sqlx::query_as("SELECT payload, created_at FROM view_cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let now = chrono::Utc::now().timestamp();
        if let Some((payload, created_at)) = &snapshot {
            if now.saturating_sub(*created_at) < self.ttl.as_secs() as i64 {
                return Ok(CachedView {
                    payload: parse_payload(key, payload)?,
                    freshness: Freshness::Fresh,
                });
            }
        }

        match source.fetch(key).await {
            Ok(payload) => {
                // Last-write-wins overwrite, no merge
                sqlx::query(
                    "INSERT INTO view_cache (key, payload, created_at) VALUES (?, ?, ?) \
                     ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, created_at = excluded.created_at",
                )
                .bind(key)
                .bind(payload.to_string())
                .bind(now)
                .execute(&self.pool)
                .await?;

                tracing::debug!(key, "Refreshed view snapshot");
                Ok(CachedView { payload, freshness: Freshness::Fresh })
            }
            Err(e) => {
                if let Some((payload, created_at)) = snapshot {
                    tracing::warn!(
                        key,
                        error = %e,
                        age_seconds = now.saturating_sub(created_at),
                        "View source unreachable, serving stale snapshot"
                    );
                    Ok(CachedView {
                        payload: parse_payload(key, &payload)?,
                        freshness: Freshness::StaleFallback,
                    })
                } else {
                    Err(Error::SourceUnavailable(e.to_string()))
                }
            }
        }
    }

    /// Drop a snapshot outright
    ///
    /// The next `get` for the key must rebuild from the source.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM view_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_payload(key: &str, payload: &str) -> Result<serde_json::Value> {
    serde_json::from_str(payload)
        .map_err(|e| Error::Internal(format!("Corrupt cache payload for '{}': {}", key, e)))
}

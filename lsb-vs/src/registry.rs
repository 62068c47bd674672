//! Reviewer Registry collaborator
//!
//! Resolves an opaque submission token to a registered reviewer. The
//! registry rows are managed outside this service; production reads them
//! from the shared database.

use async_trait::async_trait;
use sqlx::SqlitePool;

use lsb_common::db::models::{parse_guid, Reviewer};
use lsb_common::{Error, Result};

/// Token → reviewer resolution seam
#[async_trait]
pub trait ReviewerRegistry: Send + Sync {
    /// Resolve a token to a reviewer, active or not
    ///
    /// Returns [`Error::UnknownReviewer`] when no reviewer carries the
    /// token. Activity gating is the caller's decision (submission rejects
    /// inactive reviewers; aggregation keeps their history).
    async fn resolve(&self, token: &str) -> Result<Reviewer>;
}

/// Database-backed registry reading the externally-managed reviewers table
pub struct DbReviewerRegistry {
    pool: SqlitePool,
}

impl DbReviewerRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewerRegistry for DbReviewerRegistry {
    async fn resolve(&self, token: &str) -> Result<Reviewer> {
        let row: Option<(String, Option<String>, f64, i64)> = sqlx::query_as(
            "SELECT guid, display_name, weight, active FROM reviewers WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let (guid, display_name, weight, active) = row.ok_or(Error::UnknownReviewer)?;

        Ok(Reviewer {
            id: parse_guid("reviewer", &guid)?,
            display_name,
            weight,
            active: active != 0,
        })
    }
}

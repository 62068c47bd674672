//! Completion tracking
//!
//! Read-side projection over the ledger for one (match, reviewer) pair.
//! Holds no state of its own; recomputed from the ledger on every call, so
//! it can never drift from the source of truth.

use sqlx::SqlitePool;
use uuid::Uuid;

use lsb_common::types::ATTRIBUTE_COUNT;
use lsb_common::{CompletionStatus, Result};

/// Review progress of one reviewer over one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub status: CompletionStatus,
    /// Distinct attributes voted so far
    pub voted: usize,
    /// Display form, e.g. "3/6"
    pub progress: String,
}

/// Classify (match, reviewer) progress from the ledger
pub async fn completion_status(
    pool: &SqlitePool,
    match_id: Uuid,
    reviewer_id: Uuid,
) -> Result<CompletionReport> {
    let voted: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT attribute) FROM votes WHERE match_id = ? AND reviewer_id = ?",
    )
    .bind(match_id.to_string())
    .bind(reviewer_id.to_string())
    .fetch_one(pool)
    .await?;

    let voted = voted as usize;
    Ok(CompletionReport {
        status: CompletionStatus::from_attribute_count(voted),
        voted,
        progress: format!("{}/{}", voted, ATTRIBUTE_COUNT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsb_common::Attribute;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> (SqlitePool, Uuid, Uuid) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        lsb_common::db::create_schema(&pool).await.unwrap();

        let (match_id, reviewer_id) = (Uuid::new_v4(), Uuid::new_v4());
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());

        sqlx::query("INSERT INTO players (guid, handle) VALUES (?, 'a'), (?, 'b')")
            .bind(p1.to_string())
            .bind(p2.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO reviewers (guid, token, weight) VALUES (?, 'tok', 1.0)")
            .bind(reviewer_id.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO matches (guid, division_code, player1_id, player2_id) VALUES (?, 'S', ?, ?)")
            .bind(match_id.to_string())
            .bind(p1.to_string())
            .bind(p2.to_string())
            .execute(&pool)
            .await
            .unwrap();

        (pool, match_id, reviewer_id)
    }

    async fn insert_vote(pool: &SqlitePool, match_id: Uuid, reviewer_id: Uuid, attribute: Attribute) {
        sqlx::query(
            "INSERT INTO votes (match_id, reviewer_id, attribute, value, player1_id, player2_id) \
             SELECT ?, ?, ?, 0, player1_id, player2_id FROM matches WHERE guid = ?",
        )
        .bind(match_id.to_string())
        .bind(reviewer_id.to_string())
        .bind(attribute.as_str())
        .bind(match_id.to_string())
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_votes_is_pending() {
        let (pool, match_id, reviewer_id) = setup_test_db().await;
        let report = completion_status(&pool, match_id, reviewer_id).await.unwrap();
        assert_eq!(report.status, CompletionStatus::Pending);
        assert_eq!(report.progress, "0/6");
    }

    #[tokio::test]
    async fn some_votes_is_partial() {
        let (pool, match_id, reviewer_id) = setup_test_db().await;
        insert_vote(&pool, match_id, reviewer_id, Attribute::Micro).await;
        insert_vote(&pool, match_id, reviewer_id, Attribute::Macro).await;
        insert_vote(&pool, match_id, reviewer_id, Attribute::Clutch).await;

        let report = completion_status(&pool, match_id, reviewer_id).await.unwrap();
        assert_eq!(report.status, CompletionStatus::Partial);
        assert_eq!(report.progress, "3/6");
    }

    #[tokio::test]
    async fn all_six_is_completed_regardless_of_order() {
        let (pool, match_id, reviewer_id) = setup_test_db().await;
        // Reverse canonical order; classification only counts distinct names
        for attribute in Attribute::ALL.iter().rev() {
            insert_vote(&pool, match_id, reviewer_id, *attribute).await;
        }

        let report = completion_status(&pool, match_id, reviewer_id).await.unwrap();
        assert_eq!(report.status, CompletionStatus::Completed);
        assert_eq!(report.progress, "6/6");
    }

    #[tokio::test]
    async fn progress_is_scoped_to_the_reviewer() {
        let (pool, match_id, reviewer_id) = setup_test_db().await;
        let other = Uuid::new_v4();
        sqlx::query("INSERT INTO reviewers (guid, token, weight) VALUES (?, 'tok-2', 1.0)")
            .bind(other.to_string())
            .execute(&pool)
            .await
            .unwrap();

        insert_vote(&pool, match_id, other, Attribute::Micro).await;

        let report = completion_status(&pool, match_id, reviewer_id).await.unwrap();
        assert_eq!(report.status, CompletionStatus::Pending);
    }
}

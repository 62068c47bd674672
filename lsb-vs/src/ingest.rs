//! Vote ingestion
//!
//! Validates a submission batch against the registry and catalog, then
//! appends the non-duplicate votes to the ledger in one transaction.
//! Duplicate detection is a single atomic insert guarded by the ledger's
//! uniqueness constraint; there is no check-then-insert window.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use uuid::Uuid;

use lsb_common::db::models::MatchFacts;
use lsb_common::{Attribute, Error, Result, VoteValue};

use crate::cache::ViewCache;
use crate::catalog::MatchCatalog;
use crate::registry::ReviewerRegistry;

/// One submission batch, parsed and typed at the API boundary
///
/// `values` maps each attribute to its raw ternary value; attribute keys
/// outside the closed set never parse, while out-of-domain values are
/// rejected per entry during ingestion so the rest of the batch proceeds.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub reviewer_token: String,
    pub match_id: Uuid,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub values: BTreeMap<Attribute, i64>,
}

/// Per-batch ingestion result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Votes newly appended to the ledger
    pub accepted: usize,
    /// Attributes skipped because a vote already existed for the key
    pub skipped: Vec<Attribute>,
    /// Attributes rejected for an out-of-domain value
    pub invalid: Vec<Attribute>,
    /// True when every submitted entry was a duplicate
    pub all_duplicate: bool,
}

/// Vote Ingestion Service
pub struct VoteIngestor {
    db: SqlitePool,
    registry: Arc<dyn ReviewerRegistry>,
    catalog: Arc<dyn MatchCatalog>,
    cache: ViewCache,
}

impl VoteIngestor {
    pub fn new(
        db: SqlitePool,
        registry: Arc<dyn ReviewerRegistry>,
        catalog: Arc<dyn MatchCatalog>,
        cache: ViewCache,
    ) -> Self {
        Self { db, registry, catalog, cache }
    }

    /// Submit one batch of comparative votes
    ///
    /// The whole batch is one transaction: a storage fault during the
    /// non-duplicate writes rolls back everything. Duplicates and invalid
    /// values are reported per attribute, not treated as batch failures.
    ///
    /// Side effect: cached score snapshots for both players in the match's
    /// division are invalidated when any vote lands.
    pub async fn submit_votes(&self, req: SubmitRequest) -> Result<SubmitOutcome> {
        let reviewer = self.registry.resolve(&req.reviewer_token).await?;
        if !reviewer.active {
            return Err(Error::InactiveReviewer(reviewer.id));
        }

        let facts = self.catalog.lookup(req.match_id).await?;
        verify_roster(&req, &facts)?;

        if req.values.is_empty() {
            return Err(Error::InvalidInput("Submission contains no attributes".to_string()));
        }

        // Partition the batch before touching storage; invalid entries
        // never enter the transaction.
        let mut valid: Vec<(Attribute, VoteValue)> = Vec::new();
        let mut invalid: Vec<Attribute> = Vec::new();
        for (&attribute, &raw) in &req.values {
            match VoteValue::try_from(raw) {
                Ok(value) => valid.push((attribute, value)),
                Err(_) => invalid.push(attribute),
            }
        }

        let mut accepted = 0usize;
        let mut skipped: Vec<Attribute> = Vec::new();

        let mut tx = self.db.begin().await?;
        for (attribute, value) in &valid {
            let result = sqlx::query(
                r#"
                INSERT INTO votes (match_id, reviewer_id, attribute, value, player1_id, player2_id)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(match_id, reviewer_id, attribute) DO NOTHING
                "#,
            )
            .bind(req.match_id.to_string())
            .bind(reviewer.id.to_string())
            .bind(attribute.as_str())
            .bind(value.as_i64())
            .bind(facts.player1_id.to_string())
            .bind(facts.player2_id.to_string())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // A row already holds this (match, reviewer, attribute) key;
                // the first value persists.
                skipped.push(*attribute);
            } else {
                accepted += 1;
            }

            tracing::debug!(
                match_id = %req.match_id,
                reviewer_id = %reviewer.id,
                attribute = %attribute,
                duplicate = result.rows_affected() == 0,
                "Processed vote"
            );
        }
        tx.commit().await?;

        if accepted > 0 {
            // Cached score snapshots for both players are now out of date
            self.cache
                .invalidate(&score_cache_key(&facts.division_code, facts.player1_id))
                .await?;
            self.cache
                .invalidate(&score_cache_key(&facts.division_code, facts.player2_id))
                .await?;
        }

        let all_duplicate = skipped.len() == req.values.len();

        tracing::info!(
            match_id = %req.match_id,
            reviewer_id = %reviewer.id,
            accepted,
            skipped = skipped.len(),
            invalid = invalid.len(),
            all_duplicate,
            "Vote batch processed"
        );

        Ok(SubmitOutcome { accepted, skipped, invalid, all_duplicate })
    }
}

/// Cache key for a player's score snapshot in one division
pub fn score_cache_key(division_code: &str, player_id: Uuid) -> String {
    format!("scores:{}:{}", division_code, player_id)
}

/// Reject submissions whose roster disagrees with the catalog
///
/// A stale or tampered form would otherwise write inconsistent
/// denormalized player columns into the ledger.
fn verify_roster(req: &SubmitRequest, facts: &MatchFacts) -> Result<()> {
    if req.player1_id != facts.player1_id || req.player2_id != facts.player2_id {
        return Err(Error::InvalidInput(format!(
            "Submitted roster does not match catalog for match {}",
            facts.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DbMatchCatalog;
    use crate::registry::DbReviewerRegistry;
    use sqlx::sqlite::SqlitePoolOptions;

    struct Fixture {
        pool: SqlitePool,
        ingestor: VoteIngestor,
        match_id: Uuid,
        player1: Uuid,
        player2: Uuid,
    }

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        lsb_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    async fn setup_fixture() -> Fixture {
        let pool = setup_test_db().await;
        let (match_id, player1, player2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        sqlx::query("INSERT INTO players (guid, handle) VALUES (?, 'alpha'), (?, 'beta')")
            .bind(player1.to_string())
            .bind(player2.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO reviewers (guid, token, weight, active) VALUES (?, 'tok-active', 1.0, 1)")
            .bind(Uuid::new_v4().to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO matches (guid, division_code, player1_id, player2_id) VALUES (?, 'S', ?, ?)")
            .bind(match_id.to_string())
            .bind(player1.to_string())
            .bind(player2.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let ingestor = VoteIngestor::new(
            pool.clone(),
            Arc::new(DbReviewerRegistry::new(pool.clone())),
            Arc::new(DbMatchCatalog::new(pool.clone())),
            ViewCache::new(pool.clone(), std::time::Duration::from_secs(900)),
        );

        Fixture { pool, ingestor, match_id, player1, player2 }
    }

    fn request(fix: &Fixture, values: &[(Attribute, i64)]) -> SubmitRequest {
        SubmitRequest {
            reviewer_token: "tok-active".to_string(),
            match_id: fix.match_id,
            player1_id: fix.player1,
            player2_id: fix.player2,
            values: values.iter().copied().collect(),
        }
    }

    async fn ledger_count(pool: &SqlitePool, match_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE match_id = ?")
            .bind(match_id.to_string())
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_new_batch() {
        let fix = setup_fixture().await;
        let outcome = fix
            .ingestor
            .submit_votes(request(
                &fix,
                &[(Attribute::Micro, 1), (Attribute::Macro, 0), (Attribute::Clutch, 2)],
            ))
            .await
            .unwrap();

        assert_eq!(outcome.accepted, 3);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.invalid.is_empty());
        assert!(!outcome.all_duplicate);
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 3);
    }

    #[tokio::test]
    async fn duplicate_key_keeps_first_value() {
        let fix = setup_fixture().await;
        fix.ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1)]))
            .await
            .unwrap();

        // Same key, different value: the second submission is skipped
        let outcome = fix
            .ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 2)]))
            .await
            .unwrap();
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.skipped, vec![Attribute::Micro]);
        assert!(outcome.all_duplicate);

        let value: i64 = sqlx::query_scalar(
            "SELECT value FROM votes WHERE match_id = ? AND attribute = 'micro'",
        )
        .bind(fix.match_id.to_string())
        .fetch_one(&fix.pool)
        .await
        .unwrap();
        assert_eq!(value, 1);
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 1);
    }

    #[tokio::test]
    async fn full_resubmission_reports_all_duplicate() {
        let fix = setup_fixture().await;
        let all_six: Vec<(Attribute, i64)> = Attribute::ALL.iter().map(|&a| (a, 0)).collect();

        let first = fix.ingestor.submit_votes(request(&fix, &all_six)).await.unwrap();
        assert_eq!(first.accepted, 6);

        let second = fix.ingestor.submit_votes(request(&fix, &all_six)).await.unwrap();
        assert_eq!(second.accepted, 0);
        assert_eq!(second.skipped.len(), 6);
        assert!(second.all_duplicate);
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 6);
    }

    #[tokio::test]
    async fn invalid_values_do_not_block_valid_entries() {
        let fix = setup_fixture().await;
        let outcome = fix
            .ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1), (Attribute::Macro, 9)]))
            .await
            .unwrap();

        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.invalid, vec![Attribute::Macro]);
        assert!(!outcome.all_duplicate);
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 1);
    }

    #[tokio::test]
    async fn mixed_duplicate_and_invalid_is_not_all_duplicate() {
        let fix = setup_fixture().await;
        fix.ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1)]))
            .await
            .unwrap();

        let outcome = fix
            .ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1), (Attribute::Macro, -3)]))
            .await
            .unwrap();
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.skipped, vec![Attribute::Micro]);
        assert_eq!(outcome.invalid, vec![Attribute::Macro]);
        assert!(!outcome.all_duplicate);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let fix = setup_fixture().await;
        let mut req = request(&fix, &[(Attribute::Micro, 1)]);
        req.reviewer_token = "no-such-token".to_string();
        let err = fix.ingestor.submit_votes(req).await.unwrap_err();
        assert!(matches!(err, Error::UnknownReviewer));
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 0);
    }

    #[tokio::test]
    async fn inactive_reviewer_is_rejected() {
        let fix = setup_fixture().await;
        sqlx::query("INSERT INTO reviewers (guid, token, weight, active) VALUES (?, 'tok-retired', 1.0, 0)")
            .bind(Uuid::new_v4().to_string())
            .execute(&fix.pool)
            .await
            .unwrap();

        let mut req = request(&fix, &[(Attribute::Micro, 1)]);
        req.reviewer_token = "tok-retired".to_string();
        let err = fix.ingestor.submit_votes(req).await.unwrap_err();
        assert!(matches!(err, Error::InactiveReviewer(_)));
    }

    #[tokio::test]
    async fn unknown_match_is_rejected() {
        let fix = setup_fixture().await;
        let mut req = request(&fix, &[(Attribute::Micro, 1)]);
        req.match_id = Uuid::new_v4();
        let err = fix.ingestor.submit_votes(req).await.unwrap_err();
        assert!(matches!(err, Error::UnknownMatch(_)));
    }

    #[tokio::test]
    async fn roster_mismatch_is_rejected_before_any_write() {
        let fix = setup_fixture().await;
        let mut req = request(&fix, &[(Attribute::Micro, 1)]);
        req.player1_id = Uuid::new_v4();
        let err = fix.ingestor.submit_votes(req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(ledger_count(&fix.pool, fix.match_id).await, 0);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let fix = setup_fixture().await;
        let err = fix.ingestor.submit_votes(request(&fix, &[])).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn accepted_votes_invalidate_cached_scores() {
        let fix = setup_fixture().await;

        // Pre-seed stale score snapshots for both players
        for player in [fix.player1, fix.player2] {
            sqlx::query("INSERT INTO view_cache (key, payload, created_at) VALUES (?, '{}', 0)")
                .bind(score_cache_key("S", player))
                .execute(&fix.pool)
                .await
                .unwrap();
        }

        fix.ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1)]))
            .await
            .unwrap();

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM view_cache WHERE key LIKE 'scores:%'")
                .fetch_one(&fix.pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn duplicate_only_batch_leaves_cache_untouched() {
        let fix = setup_fixture().await;
        fix.ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1)]))
            .await
            .unwrap();

        sqlx::query("INSERT INTO view_cache (key, payload, created_at) VALUES (?, '{}', 0)")
            .bind(score_cache_key("S", fix.player1))
            .execute(&fix.pool)
            .await
            .unwrap();

        fix.ingestor
            .submit_votes(request(&fix, &[(Attribute::Micro, 1)]))
            .await
            .unwrap();

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM view_cache WHERE key LIKE 'scores:%'")
                .fetch_one(&fix.pool)
                .await
                .unwrap();
        assert_eq!(remaining, 1);
    }
}

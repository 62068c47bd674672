//! Match Catalog collaborator
//!
//! Canonical match facts (roster and division) are immutable history owned
//! by the league's match administration; this service only reads them.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use lsb_common::db::models::{parse_guid, MatchFacts};
use lsb_common::{Error, Result};

/// Match lookup seam
#[async_trait]
pub trait MatchCatalog: Send + Sync {
    /// Fetch canonical facts for one match
    ///
    /// Returns [`Error::UnknownMatch`] for an id with no catalog entry.
    async fn lookup(&self, match_id: Uuid) -> Result<MatchFacts>;
}

/// Database-backed catalog reading the externally-managed matches table
pub struct DbMatchCatalog {
    pool: SqlitePool,
}

impl DbMatchCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchCatalog for DbMatchCatalog {
    async fn lookup(&self, match_id: Uuid) -> Result<MatchFacts> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT division_code, player1_id, player2_id FROM matches WHERE guid = ?",
        )
        .bind(match_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let (division_code, player1, player2) = row.ok_or(Error::UnknownMatch(match_id))?;

        Ok(MatchFacts {
            id: match_id,
            division_code,
            player1_id: parse_guid("player1", &player1)?,
            player2_id: parse_guid("player2", &player2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        lsb_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn looks_up_match_facts() {
        let pool = setup_test_db().await;
        let (m, p1, p2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        sqlx::query("INSERT INTO players (guid, handle) VALUES (?, 'a'), (?, 'b')")
            .bind(p1.to_string())
            .bind(p2.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO matches (guid, division_code, player1_id, player2_id) VALUES (?, 'S', ?, ?)")
            .bind(m.to_string())
            .bind(p1.to_string())
            .bind(p2.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let catalog = DbMatchCatalog::new(pool);
        let facts = catalog.lookup(m).await.unwrap();
        assert_eq!(facts.division_code, "S");
        assert_eq!(facts.player1_id, p1);
        assert_eq!(facts.player2_id, p2);
    }

    #[tokio::test]
    async fn unknown_match_is_rejected() {
        let pool = setup_test_db().await;
        let catalog = DbMatchCatalog::new(pool);
        let missing = Uuid::new_v4();
        let err = catalog.lookup(missing).await.unwrap_err();
        assert!(matches!(err, Error::UnknownMatch(id) if id == missing));
    }
}

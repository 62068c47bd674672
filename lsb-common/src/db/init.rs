//! Database initialization
//!
//! Creates the database on first run, applies the schema idempotently, and
//! ensures every settings knob exists with its default value.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent readers with one writer, so aggregation reads
    // never block vote ingestion
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Provisional busy timeout; re-applied from settings after init
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    // Apply configurable busy timeout from settings
    let timeout_ms: i64 = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'db_busy_timeout_ms'",
    )
    .fetch_optional(&pool)
    .await?
    .unwrap_or(5000);

    let pragma_sql = format!("PRAGMA busy_timeout = {}", timeout_ms);
    sqlx::query(&pragma_sql).execute(&pool).await?;

    info!("Database busy timeout set to {} ms", timeout_ms);

    Ok(pool)
}

/// Create all tables and indexes (idempotent - safe to call multiple times)
///
/// Split out from [`init_database`] so tests can apply the schema to an
/// in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_reviewers_table(pool).await?;
    create_players_table(pool).await?;
    create_matches_table(pool).await?;
    create_votes_table(pool).await?;
    create_view_cache_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the reviewers table
///
/// Registry rows are managed externally; this service only reads them.
/// `token` is the opaque credential a submission carries.
pub async fn create_reviewers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviewers (
            guid TEXT PRIMARY KEY,
            token TEXT NOT NULL UNIQUE,
            display_name TEXT,
            weight REAL NOT NULL DEFAULT 1.0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (weight > 0.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviewers_token ON reviewers(token)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the players table
///
/// Catalog rows are managed externally; this service only reads them.
pub async fn create_players_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            guid TEXT PRIMARY KEY,
            handle TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the matches table
///
/// Immutable historical match facts, managed externally.
pub async fn create_matches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            guid TEXT PRIMARY KEY,
            division_code TEXT NOT NULL,
            player1_id TEXT NOT NULL REFERENCES players(guid),
            player2_id TEXT NOT NULL REFERENCES players(guid),
            played_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (player1_id <> player2_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_division ON matches(division_code)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_player1 ON matches(player1_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_player2 ON matches(player2_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the votes table (the append-only ledger)
///
/// One row per (match, reviewer, attribute); the UNIQUE constraint is the
/// storage-level guard that resolves concurrent duplicate submissions.
/// Rows are never updated or deleted.
pub async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL REFERENCES matches(guid),
            reviewer_id TEXT NOT NULL REFERENCES reviewers(guid),
            attribute TEXT NOT NULL,
            value INTEGER NOT NULL,
            player1_id TEXT NOT NULL REFERENCES players(guid),
            player2_id TEXT NOT NULL REFERENCES players(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (match_id, reviewer_id, attribute),
            CHECK (attribute IN ('micro', 'macro', 'clutch', 'creativity', 'aggression', 'strategy')),
            CHECK (value >= 0 AND value <= 2)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_votes_match_reviewer ON votes(match_id, reviewer_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_player1 ON votes(player1_id, attribute)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_player2 ON votes(player2_id, attribute)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the view_cache table
///
/// One serialized snapshot blob per logical key with its creation time
/// embedded as unix seconds. Expired rows are kept until the next
/// successful refresh so they can serve as stale fallback.
pub async fn create_view_cache_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS view_cache (
            key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Scoring policy
    ensure_setting(pool, "attribute_offset", "5.0").await?;
    ensure_setting(pool, "chart_min", "2.0").await?;
    ensure_setting(pool, "chart_max", "10.0").await?;
    ensure_setting(pool, "outcome_spread", "3.0").await?;

    // Derived-view cache
    ensure_setting(pool, "view_cache_ttl_seconds", "900").await?; // 15 minutes

    // HTTP server
    ensure_setting(pool, "http_bind_addr", "127.0.0.1:5730").await?;

    // Database lock wait
    ensure_setting(pool, "db_busy_timeout_ms", "5000").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it is created with the default. A NULL
/// value is reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization races
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;
        tracing::warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

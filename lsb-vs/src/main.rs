//! lsb-vs (Vote Service) - Comparative vote ingestion and skill scoring
//!
//! Accepts pairwise comparative judgments from league reviewers, tracks
//! per-reviewer completion, aggregates weighted attribute scores per
//! player per division, and serves derived views through a TTL cache
//! with stale fallback.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lsb_common::config::{database_path, resolve_data_folder};
use lsb_common::db::init_database;
use lsb_common::params::{get_setting_string, ScoringParams};
use lsb_vs::cache::ViewCache;
use lsb_vs::catalog::DbMatchCatalog;
use lsb_vs::registry::DbReviewerRegistry;
use lsb_vs::{build_router, AppState};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "lsb-vs", about = "League Skill Board vote service")]
struct Args {
    /// Data folder containing lsb.db (overrides env and config file)
    #[arg(long)]
    data_folder: Option<String>,

    /// HTTP bind address (overrides the http_bind_addr setting)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber first so startup is observable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification before any database delays
    info!(
        "Starting LSB Vote Service (lsb-vs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), "LSB_DATA_FOLDER");
    let db_path = database_path(&data_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    let scoring = ScoringParams::load(&pool).await?;
    info!(
        "Scoring policy: offset {} spread {} bounds [{}, {}]",
        scoring.attribute_offset, scoring.outcome_spread, scoring.chart_min, scoring.chart_max
    );

    let ttl = ViewCache::load_ttl(&pool).await?;
    info!("Derived-view cache TTL: {}s", ttl.as_secs());

    let bind_addr = match args.bind {
        Some(addr) => addr,
        None => get_setting_string(&pool, "http_bind_addr")
            .await?
            .unwrap_or_else(|| "127.0.0.1:5730".to_string()),
    };

    let state = AppState::new(
        pool.clone(),
        Arc::new(DbReviewerRegistry::new(pool.clone())),
        Arc::new(DbMatchCatalog::new(pool.clone())),
        scoring,
        ViewCache::new(pool, ttl),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("lsb-vs listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

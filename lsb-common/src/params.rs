//! Scoring parameter management
//!
//! Loads the chart/displacement knobs from the settings table into a plain
//! struct carried in application state and passed explicitly into
//! aggregation calls. Returns defaults for anything not set.

use sqlx::SqlitePool;

use crate::types::Outcome;
use crate::Result;

/// Scoring policy knobs for the attribute aggregator
///
/// The ternary-outcome → score-point mapping is a configurable policy:
/// neutral outcomes land exactly at `attribute_offset`, favorable and
/// unfavorable outcomes displace symmetrically by `outcome_spread`, and
/// every point is clamped to `[chart_min, chart_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    /// Anchor of the score space; a pure-tie history sits exactly here
    pub attribute_offset: f64,
    /// Lower chart bound
    pub chart_min: f64,
    /// Upper chart bound
    pub chart_max: f64,
    /// Symmetric displacement applied to favorable/unfavorable outcomes
    pub outcome_spread: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            attribute_offset: 5.0,
            chart_min: 2.0,
            chart_max: 10.0,
            // Symmetric reach: min(offset - chart_min, chart_max - offset)
            outcome_spread: 3.0,
        }
    }
}

impl ScoringParams {
    /// Load scoring parameters from the settings table
    ///
    /// Missing keys keep their compiled defaults.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let mut params = Self::default();
        let mut loaded_count = 0;

        if let Some(val) = get_setting_f64(pool, "attribute_offset").await? {
            params.attribute_offset = val;
            loaded_count += 1;
        }
        if let Some(val) = get_setting_f64(pool, "chart_min").await? {
            params.chart_min = val;
            loaded_count += 1;
        }
        if let Some(val) = get_setting_f64(pool, "chart_max").await? {
            params.chart_max = val;
            loaded_count += 1;
        }
        if let Some(val) = get_setting_f64(pool, "outcome_spread").await? {
            params.outcome_spread = val;
            loaded_count += 1;
        }

        tracing::info!("Loaded {} scoring parameters from database (4 total)", loaded_count);
        params.validate()?;
        Ok(params)
    }

    /// Reject configurations that cannot produce in-range scores
    pub fn validate(&self) -> Result<()> {
        if self.chart_min >= self.chart_max {
            return Err(crate::Error::Config(format!(
                "chart_min ({}) must be below chart_max ({})",
                self.chart_min, self.chart_max
            )));
        }
        if self.attribute_offset < self.chart_min || self.attribute_offset > self.chart_max {
            return Err(crate::Error::Config(format!(
                "attribute_offset ({}) outside chart bounds [{}, {}]",
                self.attribute_offset, self.chart_min, self.chart_max
            )));
        }
        if self.outcome_spread <= 0.0 {
            return Err(crate::Error::Config(format!(
                "outcome_spread ({}) must be positive",
                self.outcome_spread
            )));
        }
        Ok(())
    }

    /// Map a vote outcome to its point in score space
    pub fn point_for(&self, outcome: Outcome) -> f64 {
        let raw = match outcome {
            Outcome::Neutral => self.attribute_offset,
            Outcome::Favorable => self.attribute_offset + self.outcome_spread,
            Outcome::Unfavorable => self.attribute_offset - self.outcome_spread,
        };
        raw.clamp(self.chart_min, self.chart_max)
    }
}

/// Read a single setting as f64, None when absent or unparseable
pub async fn get_setting_f64(pool: &SqlitePool, key: &str) -> Result<Option<f64>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value.and_then(|v| v.parse().ok()))
}

/// Read a single setting as i64, None when absent or unparseable
pub async fn get_setting_i64(pool: &SqlitePool, key: &str) -> Result<Option<i64>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value.and_then(|v| v.parse().ok()))
}

/// Read a single setting as a string, None when absent
pub async fn get_setting_string(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Upsert a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

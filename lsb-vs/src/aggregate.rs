//! Attribute aggregation
//!
//! Turns the ledger's pairwise ternary judgments into absolute per-player
//! attribute scores. Pure function of the ledger snapshot: deterministic,
//! side-effect-free, safe to recompute at any time and to run concurrently
//! with ongoing ingestion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use lsb_common::params::ScoringParams;
use lsb_common::{Attribute, PlayerSide, Result, VoteValue};

/// Whether a (player, division) pair has ever received a vote
///
/// Transitions `Unscored` → `Scored` on the first accepted vote touching
/// the pair and never reverts (ledger rows are never deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreState {
    Unscored,
    Scored,
}

/// Aggregated attribute scores for one player in one division
///
/// `None` per attribute means no contributing votes for that attribute,
/// distinguishable from any numeric score, including a real score equal to
/// the neutral offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDivisionScores {
    pub player_id: Uuid,
    pub division_code: String,
    pub state: ScoreState,
    pub scores: BTreeMap<Attribute, Option<f64>>,
    pub computed_at: String,
}

/// One contributing vote, reduced to what the scoring mean needs
type Contribution = (VoteValue, PlayerSide, f64);

/// Weighted mean of the outcome points for one attribute
///
/// A weight-2 reviewer's single vote counts exactly as two weight-1 votes.
/// Returns `None` for an empty contribution set.
pub fn weighted_score(contributions: &[Contribution], params: &ScoringParams) -> Option<f64> {
    if contributions.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (value, side, weight) in contributions {
        weighted_sum += params.point_for(value.outcome_for(*side)) * weight;
        total_weight += weight;
    }

    Some(weighted_sum / total_weight)
}

/// Aggregate one attribute for one player in one division
///
/// `None` is the `Unscored` state: no contributing votes.
pub async fn get_score(
    pool: &SqlitePool,
    params: &ScoringParams,
    player_id: Uuid,
    division_code: &str,
    attribute: Attribute,
) -> Result<Option<f64>> {
    let contributions = load_contributions(pool, player_id, division_code, Some(attribute)).await?;
    let by_attribute = contributions.get(&attribute).map(Vec::as_slice).unwrap_or(&[]);
    Ok(weighted_score(by_attribute, params))
}

/// Aggregate all six attributes for one player in one division
pub async fn get_attribute_scores(
    pool: &SqlitePool,
    params: &ScoringParams,
    player_id: Uuid,
    division_code: &str,
) -> Result<PlayerDivisionScores> {
    let contributions = load_contributions(pool, player_id, division_code, None).await?;

    let mut scores = BTreeMap::new();
    for attribute in Attribute::ALL {
        let by_attribute = contributions.get(&attribute).map(Vec::as_slice).unwrap_or(&[]);
        scores.insert(attribute, weighted_score(by_attribute, params));
    }

    let state = if contributions.values().any(|c| !c.is_empty()) {
        ScoreState::Scored
    } else {
        ScoreState::Unscored
    };

    Ok(PlayerDivisionScores {
        player_id,
        division_code: division_code.to_string(),
        state,
        scores,
        computed_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    })
}

/// Divisions where the player has contributing votes, busiest first
pub async fn list_available_divisions(pool: &SqlitePool, player_id: Uuid) -> Result<Vec<String>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT m.division_code, COUNT(*) AS vote_volume
        FROM votes v
        JOIN matches m ON m.guid = v.match_id
        WHERE v.player1_id = ? OR v.player2_id = ?
        GROUP BY m.division_code
        ORDER BY vote_volume DESC, m.division_code ASC
        "#,
    )
    .bind(player_id.to_string())
    .bind(player_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(code, _)| code).collect())
}

/// Load every contributing vote for the player/division, grouped by attribute
///
/// Joins the registry for reviewer weights; reviewers deactivated after
/// voting still contribute (deactivation gates submission, not history).
async fn load_contributions(
    pool: &SqlitePool,
    player_id: Uuid,
    division_code: &str,
    attribute: Option<Attribute>,
) -> Result<BTreeMap<Attribute, Vec<Contribution>>> {
    let mut sql = String::from(
        r#"
        SELECT v.attribute, v.value, v.player1_id, r.weight
        FROM votes v
        JOIN matches m ON m.guid = v.match_id
        JOIN reviewers r ON r.guid = v.reviewer_id
        WHERE m.division_code = ? AND (v.player1_id = ? OR v.player2_id = ?)
        "#,
    );
    if attribute.is_some() {
        sql.push_str(" AND v.attribute = ?");
    }

    let mut query = sqlx::query_as::<_, (String, i64, String, f64)>(&sql)
        .bind(division_code)
        .bind(player_id.to_string())
        .bind(player_id.to_string());
    if let Some(attribute) = attribute {
        query = query.bind(attribute.as_str());
    }

    let rows = query.fetch_all(pool).await?;

    let player_guid = player_id.to_string();
    let mut grouped: BTreeMap<Attribute, Vec<Contribution>> = BTreeMap::new();
    for (attribute, value, player1_guid, weight) in rows {
        let attribute: Attribute = attribute.parse()?;
        let value = VoteValue::try_from(value)?;
        let side = if player1_guid == player_guid {
            PlayerSide::Player1
        } else {
            PlayerSide::Player2
        };
        grouped.entry(attribute).or_default().push((value, side, weight));
    }

    Ok(grouped)
}

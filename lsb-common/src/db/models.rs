//! Database models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Registry entry for a human reviewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: Uuid,
    pub display_name: Option<String>,
    /// Multiplier applied to this reviewer's votes during aggregation
    pub weight: f64,
    pub active: bool,
}

/// Canonical match facts from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFacts {
    pub id: Uuid,
    pub division_code: String,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
}

/// One immutable ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub match_id: Uuid,
    pub reviewer_id: Uuid,
    pub attribute: String,
    pub value: i64,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub created_at: String,
}

/// Parse a TEXT guid column into a Uuid
pub fn parse_guid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid {} GUID '{}': {}", column, value, e)))
}

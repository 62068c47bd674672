//! Closed domain types for the voting pipeline
//!
//! Submissions are parsed into these types at the API boundary; anything
//! outside the closed attribute set or the ternary value domain never
//! reaches the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Number of fixed skill attributes per match review
pub const ATTRIBUTE_COUNT: usize = 6;

/// The six fixed skill attributes scored per player per division
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Micro,
    Macro,
    Clutch,
    Creativity,
    Aggression,
    Strategy,
}

impl Attribute {
    /// All attributes, in canonical order
    pub const ALL: [Attribute; ATTRIBUTE_COUNT] = [
        Attribute::Micro,
        Attribute::Macro,
        Attribute::Clutch,
        Attribute::Creativity,
        Attribute::Aggression,
        Attribute::Strategy,
    ];

    /// Stable lowercase name, used as the ledger's TEXT representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Micro => "micro",
            Attribute::Macro => "macro",
            Attribute::Clutch => "clutch",
            Attribute::Creativity => "creativity",
            Attribute::Aggression => "aggression",
            Attribute::Strategy => "strategy",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "micro" => Ok(Attribute::Micro),
            "macro" => Ok(Attribute::Macro),
            "clutch" => Ok(Attribute::Clutch),
            "creativity" => Ok(Attribute::Creativity),
            "aggression" => Ok(Attribute::Aggression),
            "strategy" => Ok(Attribute::Strategy),
            other => Err(Error::InvalidInput(format!("Unknown attribute: {}", other))),
        }
    }
}

/// Ternary comparative judgment recorded per attribute per match per reviewer
///
/// 0 = tie/unsure, 1 = player1 better, 2 = player2 better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Tie,
    Player1Better,
    Player2Better,
}

impl VoteValue {
    /// Wire/storage representation
    pub fn as_i64(&self) -> i64 {
        match self {
            VoteValue::Tie => 0,
            VoteValue::Player1Better => 1,
            VoteValue::Player2Better => 2,
        }
    }

    /// Signed outcome of this vote relative to one side of the match
    pub fn outcome_for(&self, side: PlayerSide) -> Outcome {
        match (self, side) {
            (VoteValue::Tie, _) => Outcome::Neutral,
            (VoteValue::Player1Better, PlayerSide::Player1) => Outcome::Favorable,
            (VoteValue::Player1Better, PlayerSide::Player2) => Outcome::Unfavorable,
            (VoteValue::Player2Better, PlayerSide::Player1) => Outcome::Unfavorable,
            (VoteValue::Player2Better, PlayerSide::Player2) => Outcome::Favorable,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteValue::Tie),
            1 => Ok(VoteValue::Player1Better),
            2 => Ok(VoteValue::Player2Better),
            other => Err(Error::InvalidVoteValue(other)),
        }
    }
}

/// Which roster slot the queried player occupied in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSide {
    Player1,
    Player2,
}

/// Vote outcome relative to a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Favorable,
    Neutral,
    Unfavorable,
}

/// Review progress of one (match, reviewer) pair over the six attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Partial,
    Completed,
}

impl CompletionStatus {
    /// Classify a distinct-attribute count from the ledger
    pub fn from_attribute_count(count: usize) -> Self {
        match count {
            0 => CompletionStatus::Pending,
            n if n >= ATTRIBUTE_COUNT => CompletionStatus::Completed,
            _ => CompletionStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Pending => "pending",
            CompletionStatus::Partial => "partial",
            CompletionStatus::Completed => "completed",
        }
    }
}

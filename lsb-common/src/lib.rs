//! # LSB Common Library
//!
//! Shared code for the League Skill Board services including:
//! - Database schema and models
//! - Closed vote/attribute domain types
//! - Scoring parameters (settings-backed)
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod params;
pub mod types;

pub use error::{Error, Result};
pub use types::{Attribute, CompletionStatus, Outcome, PlayerSide, VoteValue};

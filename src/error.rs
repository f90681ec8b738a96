//! Typed failures surfaced by the scoring core.
//!
//! The core never panics on bad data; every failure ends up here and the
//! caller (HTTP handler, CLI, tests) decides whether to abort or continue.

use thiserror::Error;

/// Problems with a single review record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewError {
    /// `total_vote < helpful_yes` would give a negative `helpful_no`.
    #[error("malformed votes: helpful_yes={helpful_yes} exceeds total_vote={total_vote}")]
    MalformedVotes { helpful_yes: u64, total_vote: u64 },
}

/// Problems with scoring parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
}

/// Problems while aggregating a time-weighted rating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RatingError {
    #[error("cannot aggregate an empty review set")]
    EmptyDataset,

    /// A quartile carrying a nonzero weight has no members, so its mean is undefined.
    #[error("time quartile {bucket} is empty but carries weight {weight}")]
    EmptyBucket { bucket: usize, weight: f64 },

    #[error("non-finite {field} in review #{index}")]
    NonFinite { field: &'static str, index: usize },
}

//! # Ranking
//! Annotate reviews with all three helpfulness scores and pick the top `k`.
//!
//! Input is never touched: each result is an owned copy of the review plus
//! its scores. Sorting is stable, so reviews with equal scores keep their
//! original input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReviewError;
use crate::review::{MalformedPolicy, Review};
use crate::scoring::{score_with_confidence, Confidence, Scores};

pub const DEFAULT_TOP_K: usize = 20;

/// Which score orders the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// Net helpful votes.
    PosNegDiff,
    /// Share of helpful votes.
    AverageRating,
    #[default]
    WilsonLowerBound,
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreKind::PosNegDiff => "score_pos_neg_diff",
            ScoreKind::AverageRating => "score_average_rating",
            ScoreKind::WilsonLowerBound => "wilson_lower_bound",
        };
        f.write_str(s)
    }
}

impl FromStr for ScoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diff" | "pos_neg_diff" | "score_pos_neg_diff" => Ok(ScoreKind::PosNegDiff),
            "average" | "ratio" | "average_rating" | "score_average_rating" => {
                Ok(ScoreKind::AverageRating)
            }
            "wilson" | "wilson_lower_bound" => Ok(ScoreKind::WilsonLowerBound),
            other => Err(format!("unknown score kind `{other}`")),
        }
    }
}

/// A review copy plus its derived `helpful_no` and scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub review: Review,
    pub helpful_no: u64,
    #[serde(flatten)]
    pub scores: Scores,
}

impl ScoredReview {
    fn cmp_desc(&self, other: &Self, by: ScoreKind) -> Ordering {
        match by {
            ScoreKind::PosNegDiff => other
                .scores
                .score_pos_neg_diff
                .cmp(&self.scores.score_pos_neg_diff),
            ScoreKind::AverageRating => other
                .scores
                .score_average_rating
                .total_cmp(&self.scores.score_average_rating),
            ScoreKind::WilsonLowerBound => other
                .scores
                .wilson_lower_bound
                .total_cmp(&self.scores.wilson_lower_bound),
        }
    }
}

/// Score every review, in input order.
pub fn annotate(
    reviews: &[Review],
    confidence: Confidence,
    policy: MalformedPolicy,
) -> Result<Vec<ScoredReview>, ReviewError> {
    reviews
        .iter()
        .map(|r| {
            let votes = r.votes(policy)?;
            Ok(ScoredReview {
                review: r.clone(),
                helpful_no: votes.down,
                scores: score_with_confidence(votes, confidence),
            })
        })
        .collect()
}

/// Sort already-annotated reviews by `by` (descending, stable) and keep `top_k`.
pub fn select_top(mut scored: Vec<ScoredReview>, top_k: usize, by: ScoreKind) -> Vec<ScoredReview> {
    scored.sort_by(|a, b| a.cmp_desc(b, by));
    scored.truncate(top_k);
    scored
}

/// Rank by Wilson lower bound at 95% confidence, rejecting malformed votes.
pub fn rank(reviews: &[Review], top_k: usize) -> Result<Vec<ScoredReview>, ReviewError> {
    rank_by(
        reviews,
        top_k,
        ScoreKind::WilsonLowerBound,
        Confidence::default(),
        MalformedPolicy::Reject,
    )
}

/// Full-control ranking.
pub fn rank_by(
    reviews: &[Review],
    top_k: usize,
    by: ScoreKind,
    confidence: Confidence,
    policy: MalformedPolicy,
) -> Result<Vec<ScoredReview>, ReviewError> {
    let scored = annotate(reviews, confidence, policy)?;
    let top = select_top(scored, top_k, by);
    debug!(
        target: "ranking",
        by = %by,
        input = reviews.len(),
        kept = top.len(),
        confidence = confidence.level(),
        "ranked reviews"
    );
    Ok(top)
}

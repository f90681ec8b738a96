//! # Helpfulness scoring
//!
//! Three candidate scores for a review's `(helpful_yes, helpful_no)` votes:
//! - `score_pos_neg_diff`   : net votes, unbounded, ignores sample size
//! - `score_average_rating` : share of helpful votes in [0,1]; 1/1 and 1000/1000 tie
//! - `wilson_lower_bound`   : lower end of the Wilson interval for the helpful share
//!
//! The Wilson bound treats each vote as a Bernoulli trial and pulls sparse
//! evidence toward 0, which is what makes it usable for a "top N" cut.
//!
//! All functions are pure and total: no input makes them panic or return NaN.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::math::probit;
use crate::review::Votes;

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Two-sided confidence level in the open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(level: f64) -> Result<Self, ScoringError> {
        if level.is_finite() && level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(ScoringError::InvalidConfidence(level))
        }
    }

    pub fn level(self) -> f64 {
        self.0
    }

    /// Standard normal quantile `z` with `Φ(z) = 1 - (1 - level) / 2`.
    pub fn z(self) -> f64 {
        probit(1.0 - (1.0 - self.0) / 2.0)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let level = f64::deserialize(deserializer)?;
        Confidence::new(level).map_err(serde::de::Error::custom)
    }
}

/// All three scores for one review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub score_pos_neg_diff: i64,
    pub score_average_rating: f64,
    pub wilson_lower_bound: f64,
}

/// Score a vote pair at the default 95% confidence.
pub fn score(helpful_yes: u64, helpful_no: u64) -> Scores {
    score_with_confidence(Votes::new(helpful_yes, helpful_no), Confidence::default())
}

pub fn score_with_confidence(votes: Votes, confidence: Confidence) -> Scores {
    Scores {
        score_pos_neg_diff: score_pos_neg_diff(votes.up, votes.down),
        score_average_rating: score_average_rating(votes.up, votes.down),
        wilson_lower_bound: wilson_lower_bound(votes.up, votes.down, confidence),
    }
}

/// `up - down`, saturating at the `i64` range.
pub fn score_pos_neg_diff(up: u64, down: u64) -> i64 {
    let diff = i128::from(up) - i128::from(down);
    diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// `up / (up + down)`, or 0 with no votes.
pub fn score_average_rating(up: u64, down: u64) -> f64 {
    let n = up as f64 + down as f64;
    if n == 0.0 {
        0.0
    } else {
        up as f64 / n
    }
}

/// Lower bound of the Wilson score interval for the helpful share.
///
/// With `n = up + down` and `phat = up / n`:
///
/// ```text
/// (phat + z²/2n − z·√((phat(1−phat) + z²/4n) / n)) / (1 + z²/n)
/// ```
///
/// No votes means no evidence, so the result is 0.
pub fn wilson_lower_bound(up: u64, down: u64, confidence: Confidence) -> f64 {
    let n = up as f64 + down as f64;
    if n == 0.0 {
        return 0.0;
    }
    let z = confidence.z();
    let z2 = z * z;
    let phat = up as f64 / n;

    let centre = phat + z2 / (2.0 * n);
    let spread = z * ((phat * (1.0 - phat) + z2 / (4.0 * n)) / n).sqrt();
    let bound = (centre - spread) / (1.0 + z2 / n);

    // Rounding can leave the bound a hair below 0 when up == 0.
    bound.clamp(0.0, 1.0)
}

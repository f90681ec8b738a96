//! # Review
//! One row of the review dataset plus the derived `helpful_no` count.
//!
//! `helpful_no` is never stored: it is recomputed from `total_vote` and
//! `helpful_yes` so the two can't drift apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReviewError;

/// A product review as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, rename = "reviewerName")]
    pub reviewer_name: Option<String>,
    /// Star rating, documented range 1.0–5.0.
    pub overall: f64,
    #[serde(default)]
    pub summary: String,
    pub helpful_yes: u64,
    pub total_vote: u64,
    /// Age in days relative to the run's reference date.
    pub day_diff: f64,
    #[serde(default, rename = "reviewTime", skip_serializing_if = "Option::is_none")]
    pub review_time: Option<NaiveDate>,
}

/// What to do with `total_vote < helpful_yes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Surface `ReviewError::MalformedVotes`.
    #[default]
    Reject,
    /// Treat the negative count as zero and log a warning.
    Clamp,
}

/// Positive/negative vote pair fed to the score functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    pub up: u64,
    pub down: u64,
}

impl Votes {
    pub fn new(up: u64, down: u64) -> Self {
        Self { up, down }
    }
}

impl Review {
    /// Minimal constructor used by tests and tools; optional fields stay empty.
    pub fn new(overall: f64, helpful_yes: u64, total_vote: u64, day_diff: f64) -> Self {
        Self {
            reviewer_name: None,
            overall,
            summary: String::new(),
            helpful_yes,
            total_vote,
            day_diff,
            review_time: None,
        }
    }

    pub fn with_reviewer(mut self, name: impl Into<String>) -> Self {
        self.reviewer_name = Some(name.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// `total_vote - helpful_yes`, or an error when that would go negative.
    pub fn helpful_no(&self) -> Result<u64, ReviewError> {
        self.total_vote
            .checked_sub(self.helpful_yes)
            .ok_or(ReviewError::MalformedVotes {
                helpful_yes: self.helpful_yes,
                total_vote: self.total_vote,
            })
    }

    /// Derive the vote pair under the given policy.
    pub fn votes(&self, policy: MalformedPolicy) -> Result<Votes, ReviewError> {
        match (self.helpful_no(), policy) {
            (Ok(down), _) => Ok(Votes::new(self.helpful_yes, down)),
            (Err(e), MalformedPolicy::Reject) => Err(e),
            (Err(_), MalformedPolicy::Clamp) => {
                warn!(
                    target: "review",
                    helpful_yes = self.helpful_yes,
                    total_vote = self.total_vote,
                    reviewer = ?self.reviewer_name,
                    "total_vote below helpful_yes; clamping helpful_no to 0"
                );
                Ok(Votes::new(self.helpful_yes, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpful_no_is_total_minus_yes() {
        let r = Review::new(5.0, 3, 10, 12.0);
        assert_eq!(r.helpful_no(), Ok(7));
        assert_eq!(r.votes(MalformedPolicy::Reject), Ok(Votes::new(3, 7)));
    }

    #[test]
    fn zero_votes_are_fine() {
        let r = Review::new(4.0, 0, 0, 1.0);
        assert_eq!(r.votes(MalformedPolicy::Reject), Ok(Votes::new(0, 0)));
    }

    #[test]
    fn malformed_votes_rejected_by_default() {
        let r = Review::new(4.0, 5, 2, 1.0);
        let err = r.votes(MalformedPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            ReviewError::MalformedVotes {
                helpful_yes: 5,
                total_vote: 2
            }
        );
    }

    #[test]
    fn malformed_votes_clamped_on_request() {
        let r = Review::new(4.0, 5, 2, 1.0);
        assert_eq!(r.votes(MalformedPolicy::Clamp), Ok(Votes::new(5, 0)));
    }

    #[test]
    fn deserializes_original_column_names() {
        let v = serde_json::json!({
            "reviewerName": "0mie",
            "overall": 5.0,
            "summary": "MOAR SPACE!!!",
            "helpful_yes": 0,
            "total_vote": 0,
            "day_diff": 409.0,
            "reviewTime": "2013-10-25"
        });
        let r: Review = serde_json::from_value(v).unwrap();
        assert_eq!(r.reviewer_name.as_deref(), Some("0mie"));
        assert_eq!(r.review_time, NaiveDate::from_ymd_opt(2013, 10, 25));
    }
}

// src/ingest/types.rs
use chrono::NaiveDate;
use serde::Deserialize;

/// One raw row as found in the review export (CSV or JSON).
///
/// Column names follow the export; anything not listed here is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReviewRow {
    #[serde(default, rename = "reviewerName")]
    pub reviewer_name: Option<String>,
    pub overall: f64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub helpful_yes: u64,
    #[serde(default)]
    pub total_vote: u64,
    #[serde(default)]
    pub day_diff: Option<f64>,
    #[serde(default, rename = "reviewTime")]
    pub review_time: Option<String>,
    #[serde(default, rename = "unixReviewTime")]
    pub unix_review_time: Option<i64>,
}

/// Knobs for turning raw rows into reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// "Now" for `day_diff` derivation; today (UTC) when unset.
    pub reference_date: Option<NaiveDate>,
    /// Recompute `day_diff` from dates even when the column is present.
    pub prefer_dates: bool,
}

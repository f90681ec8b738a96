// src/lib.rs
// Public library surface for the binaries and integration tests.

// Scoring core (pure, no I/O)
pub mod error;
pub mod math;
pub mod ranking;
pub mod rating;
pub mod review;
pub mod scoring;

// Loading, configuration & service plumbing
pub mod api;
pub mod config;
pub mod ingest;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router};
pub use crate::config::AppConfig;
pub use crate::error::{RatingError, ReviewError, ScoringError};
pub use crate::ranking::{rank, rank_by, ScoreKind, ScoredReview, DEFAULT_TOP_K};
pub use crate::rating::{breakdown, overall_mean, weighted_average, EmptyBucketPolicy, QuartileWeights};
pub use crate::review::{MalformedPolicy, Review, Votes};
pub use crate::scoring::{
    score, score_average_rating, score_pos_neg_diff, score_with_confidence, wilson_lower_bound,
    Confidence, Scores,
};

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{RatingError, ReviewError, ScoringError};
use crate::ingest::{self, LoadOptions, RawReviewRow};
use crate::ranking::{self, ScoreKind, ScoredReview};
use crate::rating::{self, EmptyBucketPolicy, QuartileWeights, RatingBreakdown};
use crate::review::MalformedPolicy;
use crate::scoring::Confidence;
use crate::telemetry::ensure_metrics_described;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

pub fn create_router(config: AppConfig) -> Router {
    router(AppState::new(config))
}

pub fn router(state: AppState) -> Router {
    ensure_metrics_described();
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/rank", post(rank_reviews))
        .route("/rating", post(rate_reviews))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Errors mapped to HTTP; everything here is the caller's data, hence 422.
#[derive(Debug)]
pub enum ApiError {
    BadInput(String),
    Review(ReviewError),
    Rating(RatingError),
    Scoring(ScoringError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let msg = match self {
            ApiError::BadInput(m) => m,
            ApiError::Review(e) => e.to_string(),
            ApiError::Rating(e) => e.to_string(),
            ApiError::Scoring(e) => e.to_string(),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { error: msg })).into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        ApiError::Review(e)
    }
}

impl From<RatingError> for ApiError {
    fn from(e: RatingError) -> Self {
        ApiError::Rating(e)
    }
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        ApiError::Scoring(e)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RankQuery {
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    malformed: Option<MalformedPolicy>,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    by: String,
    confidence: f64,
    total: usize,
    reviews: Vec<ScoredReview>,
}

async fn rank_reviews(
    State(state): State<AppState>,
    Query(q): Query<RankQuery>,
    Json(rows): Json<Vec<RawReviewRow>>,
) -> Result<Json<RankResponse>, ApiError> {
    let cfg = &state.config.ranking;
    let by = match q.by.as_deref() {
        Some(s) => s.parse::<ScoreKind>().map_err(ApiError::BadInput)?,
        None => cfg.by,
    };
    let confidence = match q.confidence {
        Some(c) => Confidence::new(c)?,
        None => cfg.confidence,
    };
    let top_k = q.top_k.unwrap_or(cfg.top_k);
    let policy = q.malformed.unwrap_or(cfg.malformed);

    let reviews = to_reviews(rows)?;
    let total = reviews.len();
    histogram!("rank_batch_size").record(total as f64);

    let ranked = ranking::rank_by(&reviews, top_k, by, confidence, policy).map_err(|e| {
        counter!("reviews_malformed_total").increment(1);
        warn!(target: "api", error = %e, "rank rejected");
        e
    })?;
    counter!("reviews_ranked_total").increment(total as u64);
    info!(target: "api", %by, total, top_k, "rank served");

    Ok(Json(RankResponse {
        by: by.to_string(),
        confidence: confidence.level(),
        total,
        reviews: ranked,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct RatingQuery {
    /// Comma-separated quartile weights, e.g. `30,26,24,20`.
    #[serde(default)]
    w: Option<String>,
    #[serde(default)]
    empty_bucket: Option<EmptyBucketPolicy>,
}

async fn rate_reviews(
    State(state): State<AppState>,
    Query(q): Query<RatingQuery>,
    Json(rows): Json<Vec<RawReviewRow>>,
) -> Result<Json<RatingBreakdown>, ApiError> {
    let cfg = &state.config.rating;
    let weights = match q.w.as_deref() {
        Some(raw) => parse_weights(raw).map_err(ApiError::BadInput)?,
        None => cfg.weights,
    };
    let policy = q.empty_bucket.unwrap_or(cfg.empty_bucket);

    counter!("rating_requests_total").increment(1);
    let reviews = to_reviews(rows)?;
    let out = rating::breakdown(&reviews, weights, policy).map_err(|e| {
        if matches!(e, RatingError::EmptyBucket { .. }) {
            counter!("rating_empty_bucket_total").increment(1);
        }
        e
    })?;
    Ok(Json(out))
}

fn to_reviews(rows: Vec<RawReviewRow>) -> Result<Vec<crate::review::Review>, ApiError> {
    ingest::from_rows(rows, LoadOptions::default()).map_err(|e| ApiError::BadInput(format!("{e:#}")))
}

/// Parse `"28,26,24,22"` into quartile weights.
pub fn parse_weights(raw: &str) -> Result<QuartileWeights, String> {
    let parts = raw
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("invalid weight `{}`", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let arr: [f64; 4] = parts
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 4 weights, got {}", v.len()))?;
    Ok(QuartileWeights(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_parse_from_query() {
        assert_eq!(parse_weights("30, 26,24 ,20"), Ok(QuartileWeights::RECENT_HEAVY));
        assert!(parse_weights("1,2,3").unwrap_err().contains("expected 4"));
        assert!(parse_weights("1,2,x,4").unwrap_err().contains("invalid weight"));
    }
}

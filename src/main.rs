//! Review ranking service — Binary Entrypoint
//! Boots the Axum HTTP server with the scoring routes and the Prometheus endpoint.

use review_rank::{api, telemetry, AppConfig};
use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let config = AppConfig::load()?;
    info!(
        top_k = config.ranking.top_k,
        confidence = config.ranking.confidence.level(),
        weights = ?config.rating.weights.0,
        "review-rank starting"
    );

    let metrics = telemetry::Metrics::init()?;
    let router = api::create_router(config).merge(metrics.router());

    Ok(router.into())
}

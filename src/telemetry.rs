//! Logging and metrics plumbing shared by the binaries.
//!
//! The library itself only emits `tracing` events and `metrics` counters;
//! installing a subscriber or a recorder is left to the entrypoints.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "REVIEW_RANK_LOG_FORMAT";
const DEFAULT_FILTER: &str = "review_rank=info,api=info,ingest=info,config=info,warn";

/// Install a global subscriber: `RUST_LOG` filter, compact or JSON output.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("reviews_ranked_total", "Reviews scored by /rank.");
        describe_counter!(
            "reviews_malformed_total",
            "Rank requests rejected for total_vote < helpful_yes."
        );
        describe_counter!("rating_requests_total", "Time-weighted rating requests.");
        describe_counter!(
            "rating_empty_bucket_total",
            "Rating requests that hit an empty weighted quartile."
        );
        describe_histogram!("rank_batch_size", "Reviews per /rank request.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

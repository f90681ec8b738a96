// tests/metrics.rs
//
// Installs the Prometheus recorder once for this test binary, drives the
// counted paths of /rank and /rating, then scrapes /metrics.
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use review_rank::telemetry::Metrics;
use review_rank::{create_router, AppConfig};

fn build_app(metrics: &Metrics) -> Router {
    create_router(AppConfig::default()).merge(metrics.router())
}

async fn post(app: &Router, uri: &str, payload: serde_json::Value) -> StatusCode {
    app.clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn counters_show_up_after_rank_and_rating_calls() {
    // The recorder is process-global, so everything lives in one test.
    let metrics = Metrics::init().expect("install prometheus recorder");
    let app = build_app(&metrics);

    let ok = post(
        &app,
        "/rank",
        json!([{"overall": 5.0, "helpful_yes": 3, "total_vote": 4, "day_diff": 10}]),
    )
    .await;
    assert_eq!(ok, StatusCode::OK);

    let malformed = post(
        &app,
        "/rank",
        json!([{"overall": 2.0, "helpful_yes": 9, "total_vote": 4, "day_diff": 10}]),
    )
    .await;
    assert_eq!(malformed, StatusCode::UNPROCESSABLE_ENTITY);

    // Same day_diff everywhere leaves quartiles 2..4 empty under default weights.
    let empty = post(
        &app,
        "/rating",
        json!([
            {"overall": 5.0, "day_diff": 7},
            {"overall": 3.0, "day_diff": 7}
        ]),
    )
    .await;
    assert_eq!(empty, StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "reviews_ranked_total",
        "reviews_malformed_total",
        "rating_requests_total",
        "rating_empty_bucket_total",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

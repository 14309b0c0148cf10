// tests/metrics_http.rs
//
// Own test binary: the Prometheus recorder is process-global.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use feefo_product_schema::ingest::fixture::FixtureProvider;
use feefo_product_schema::ingest::Cadence;
use feefo_product_schema::metrics::Metrics;
use feefo_product_schema::{App, AppConfig, FeedError, MemoryStore};
use serde_json::json;
use tower::ServiceExt as _;

#[tokio::test]
async fn metrics_expose_cadence_and_refresh_series() {
    let config = AppConfig {
        cadence: Cadence::TwiceDaily,
        ..AppConfig::default()
    };
    let metrics = Metrics::init(&config).expect("recorder");
    assert!(Metrics::init(&config).is_err(), "second install must fail");

    let provider = Arc::new(FixtureProvider::new(
        json!({ "rating": { "rating": 4.5, "service": { "count": 12 } } }),
        json!({ "reviews": [] }),
    ));
    provider.set_summary(Err(FeedError::fetch("reviews/summary/product", "503")));
    let app = App::with_parts(config, provider, Arc::new(MemoryStore::new()));
    app.job().run_cycle().await;

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = metrics.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();

    assert!(text.contains("feefo_refresh_period_secs 43200"), "{text}");
    assert!(text.contains(r#"feefo_refresh_runs_total{action="reviews"} 1"#), "{text}");
    assert!(text.contains(r#"feefo_refresh_errors_total{action="summary"} 1"#), "{text}");
}

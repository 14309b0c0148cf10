// tests/feefo_http.rs
//
// FeefoClient against a local axum server standing in for api.feefo.com.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use feefo_product_schema::ingest::types::ReviewsProvider;
use feefo_product_schema::ingest::{FeefoClient, RatingSummary};
use feefo_product_schema::{App, AppConfig, FeedError};
use serde_json::Value;

fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    serde_json::from_str(&std::fs::read_to_string(path).expect("fixture")).expect("json")
}

/// Serve `router` on an ephemeral port; returns the API base URL.
async fn spawn_feefo(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api/")
}

fn happy_feefo() -> Router {
    let summary = fixture("summary_product.json");
    let reviews = fixture("reviews_product.json");
    Router::new()
        .route(
            "/api/10/reviews/summary/product",
            get(move || {
                let v = summary.clone();
                async move { Json(v) }
            }),
        )
        .route(
            "/api/10/reviews/product",
            get(move || {
                let v = reviews.clone();
                async move { Json(v) }
            }),
        )
}

#[tokio::test]
async fn summary_fetched_and_parsed() {
    let base = spawn_feefo(happy_feefo()).await;
    let client = FeefoClient::new(&base, "10");

    let s = client.fetch_summary().await.expect("summary");
    assert_eq!(s, RatingSummary { score: 4.5, count: 12 });

    let raws = client.fetch_reviews().await.expect("reviews");
    assert_eq!(raws.len(), 4);
}

#[tokio::test]
async fn merchant_identifier_sent_as_query() {
    let router = Router::new().route(
        "/api/10/reviews/summary/product",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            if q.get("merchant_identifier").map(String::as_str) == Some("acme-store") {
                Json(serde_json::json!({ "rating": { "rating": 4.0, "service": { "count": 3 } } }))
                    .into_response()
            } else {
                (StatusCode::BAD_REQUEST, "missing merchant").into_response()
            }
        }),
    );
    let base = spawn_feefo(router).await;

    let without = FeefoClient::new(&base, "10").fetch_summary().await;
    assert!(matches!(without, Err(FeedError::Fetch { .. })));

    let with = FeefoClient::new(&base, "10")
        .with_merchant("acme-store")
        .fetch_summary()
        .await
        .expect("scoped summary");
    assert_eq!(with.count, 3);
}

#[tokio::test]
async fn server_error_is_fetch_error() {
    let router = Router::new().route(
        "/api/10/reviews/product",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn_feefo(router).await;

    let err = FeefoClient::new(&base, "10").fetch_reviews().await.unwrap_err();
    match err {
        FeedError::Fetch { endpoint, reason } => {
            assert_eq!(endpoint, "reviews/product");
            assert!(reason.contains("500"), "reason was {reason}");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_parse_error() {
    let router = Router::new().route(
        "/api/10/reviews/summary/product",
        get(|| async { "<html>maintenance</html>" }),
    );
    let base = spawn_feefo(router).await;

    let err = FeefoClient::new(&base, "10").fetch_summary().await.unwrap_err();
    assert_eq!(err.kind(), "parse");
}

#[tokio::test]
async fn slow_server_hits_request_timeout() {
    let router = Router::new().route(
        "/api/10/reviews/summary/product",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let base = spawn_feefo(router).await;

    let err = FeefoClient::new(&base, "10")
        .with_timeout(Duration::from_millis(200))
        .fetch_summary()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "fetch");
}

#[tokio::test]
async fn refused_connection_is_fetch_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = FeefoClient::new(&format!("http://{addr}/api"), "10")
        .fetch_summary()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "fetch");
}

#[tokio::test]
async fn live_app_persists_between_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_feefo(happy_feefo()).await;

    let config = AppConfig {
        base_url: base,
        store_path: dir.path().join("store.json"),
        ..AppConfig::default()
    };
    let first = App::new(config.clone());
    let report = first.job().run_cycle().await;
    assert!(report.summary.is_updated() && report.reviews.is_updated());
    let rendered = first.renderer().render();
    drop(first);

    // Same store, Feefo now unreachable: cached values still render and a
    // failing cycle does not touch them.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}/api", listener.local_addr().unwrap());
    drop(listener);
    let second = App::new(AppConfig {
        base_url: dead,
        ..config
    });
    assert_eq!(second.renderer().render(), rendered);

    let report = second.job().run_cycle().await;
    assert_eq!(report.summary.label(), "failed");
    assert_eq!(report.reviews.label(), "failed");
    assert_eq!(second.renderer().render(), rendered);
    assert_eq!(rendered.rating_score, Some(4.5));
    assert_eq!(rendered.rating_count, Some(12));
    assert_eq!(rendered.reviews.len(), 3);
}

// src/api.rs
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::refresh::{CycleReport, RefreshJob};
use crate::render::{inject_into_head, DataLayerPayload, PayloadRenderer};

#[derive(Clone)]
pub struct AppState {
    pub renderer: PayloadRenderer,
    pub job: RefreshJob,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/head", get(head_snippet))
        .route("/payload", get(payload))
        .route("/inject", post(inject))
        .route("/admin/refresh", post(admin_refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// The `<script>` block a page template drops into its `<head>`.
async fn head_snippet(State(state): State<AppState>) -> Html<String> {
    Html(state.renderer.render_script())
}

async fn payload(State(state): State<AppState>) -> Json<DataLayerPayload> {
    Json(state.renderer.render())
}

/// Takes a full HTML document and returns it with the snippet placed at the
/// top of `<head>`.
async fn inject(State(state): State<AppState>, body: String) -> Html<String> {
    Html(inject_into_head(&body, &state.renderer.render_script()))
}

/// Runs one refresh cycle now, outside the schedule.
async fn admin_refresh(State(state): State<AppState>) -> Json<CycleReport> {
    let report = state.job.run_cycle().await;
    tracing::info!(
        target: "feefo",
        provider = state.job.provider_name(),
        summary = report.summary.label(),
        reviews = report.reviews.label(),
        "manual refresh"
    );
    Json(report)
}

//! Prometheus export for the refresh pipeline.
//!
//! Series come from the ingest side (`feefo_refresh_runs_total`,
//! `feefo_refresh_errors_total`, `feefo_reviews_skipped_total`,
//! `feefo_fetch_errors_total`, `feefo_fetch_ms`, `feefo_reviews_cached`,
//! `feefo_last_refresh_ts`). This module installs the recorder and adds
//! `feefo_refresh_period_secs`, the configured cadence in seconds.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::AppConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide recorder and publish the configured cadence.
    /// Fails if a recorder is already installed.
    pub fn init(config: &AppConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        crate::ingest::ensure_metrics_described();
        gauge!("feefo_refresh_period_secs").set(config.cadence.period().as_secs_f64());

        Ok(Self { handle })
    }

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

// src/app.rs
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::ingest::client::FeefoClient;
use crate::ingest::refresh::RefreshJob;
use crate::ingest::scheduler::{ScheduleOutcome, Scheduler};
use crate::ingest::types::ReviewsProvider;
use crate::render::PayloadRenderer;
use crate::store::{CacheStore, FeedCache, FileStore};

/// Wires the client, cache, refresh job, scheduler and renderer together.
/// Nothing runs until `start()` is called.
pub struct App {
    config: AppConfig,
    cache: FeedCache,
    job: RefreshJob,
    renderer: PayloadRenderer,
    scheduler: Scheduler,
}

impl App {
    /// Live setup: Feefo over HTTP, file-backed store at `config.store_path`.
    pub fn new(config: AppConfig) -> Self {
        let provider = Arc::new(FeefoClient::from_config(&config));
        let store = Arc::new(FileStore::open(&config.store_path));
        Self::with_parts(config, provider, store)
    }

    pub fn with_parts(
        config: AppConfig,
        provider: Arc<dyn ReviewsProvider>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let cache = FeedCache::new(store, config.option_prefix.clone());
        let job = RefreshJob::new(provider, cache.clone());
        let renderer = PayloadRenderer::new(cache.clone());
        Self {
            config,
            cache,
            job,
            renderer,
            scheduler: Scheduler::new(),
        }
    }

    /// Register the recurring refresh job. Safe to call more than once.
    pub fn start(&self) -> ScheduleOutcome {
        self.scheduler.ensure_scheduled(
            &self.config.job_id,
            self.config.cadence,
            self.job.clone(),
        )
    }

    pub fn router(&self) -> Router {
        api::router(AppState {
            renderer: self.renderer.clone(),
            job: self.job.clone(),
        })
    }

    /// Serve `router()` merged with `extra` until Ctrl-C, then stop the jobs.
    pub async fn serve(&self, extra: Router) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("binding {}", self.config.bind_addr))?;
        tracing::info!(target: "feefo", addr = %self.config.bind_addr, "listening");

        axum::serve(listener, self.router().merge(extra))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("http server")?;

        self.scheduler.shutdown();
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn job(&self) -> &RefreshJob {
        &self.job
    }

    pub fn renderer(&self) -> &PayloadRenderer {
        &self.renderer
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

// src/ingest/refresh.rs
use anyhow::Result;
use metrics::{counter, gauge};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ingest::normalize::normalize_batch;
use crate::ingest::types::{RatingSummary, ReviewsProvider};
use crate::store::FeedCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshAction {
    Summary,
    Reviews,
}

impl RefreshAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Reviews => "reviews",
        }
    }
}

/// Result of one refresh action. `Failed` and `Busy` leave the cache as it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    SummaryUpdated { score: f64, count: u64 },
    ReviewsUpdated { stored: usize, skipped: usize },
    Failed { error: String },
    /// Another invocation of the same action was still running.
    Busy,
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(
            self,
            Self::SummaryUpdated { .. } | Self::ReviewsUpdated { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SummaryUpdated { .. } | Self::ReviewsUpdated { .. } => "updated",
            Self::Failed { .. } => "failed",
            Self::Busy => "busy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub summary: RefreshOutcome,
    pub reviews: RefreshOutcome,
}

/// The two refresh actions fired by the scheduled job. The only writer of
/// the feed cache.
#[derive(Clone)]
pub struct RefreshJob {
    provider: Arc<dyn ReviewsProvider>,
    cache: FeedCache,
    summary_lock: Arc<Mutex<()>>,
    reviews_lock: Arc<Mutex<()>>,
}

impl RefreshJob {
    pub fn new(provider: Arc<dyn ReviewsProvider>, cache: FeedCache) -> Self {
        Self {
            provider,
            cache,
            summary_lock: Arc::new(Mutex::new(())),
            reviews_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Name of the provider the job fetches from, as it appears in logs.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Run both actions concurrently; a failure in one never blocks the other.
    pub async fn run_cycle(&self) -> CycleReport {
        crate::ingest::ensure_metrics_described();
        let (summary, reviews) = tokio::join!(self.refresh_summary(), self.refresh_reviews());
        CycleReport { summary, reviews }
    }

    pub async fn refresh_summary(&self) -> RefreshOutcome {
        let Ok(_guard) = self.summary_lock.try_lock() else {
            return busy(self.provider_name(), RefreshAction::Summary);
        };
        let outcome = match self.update_summary().await {
            Ok(s) => RefreshOutcome::SummaryUpdated {
                score: s.score,
                count: s.count,
            },
            Err(e) => RefreshOutcome::Failed {
                error: format!("{e:#}"),
            },
        };
        record(self.provider_name(), RefreshAction::Summary, &outcome);
        outcome
    }

    pub async fn refresh_reviews(&self) -> RefreshOutcome {
        let Ok(_guard) = self.reviews_lock.try_lock() else {
            return busy(self.provider_name(), RefreshAction::Reviews);
        };
        let outcome = match self.update_reviews().await {
            Ok((stored, skipped)) => RefreshOutcome::ReviewsUpdated { stored, skipped },
            Err(e) => RefreshOutcome::Failed {
                error: format!("{e:#}"),
            },
        };
        record(self.provider_name(), RefreshAction::Reviews, &outcome);
        outcome
    }

    async fn update_summary(&self) -> Result<RatingSummary> {
        let summary = self.provider.fetch_summary().await?;
        self.cache.store_summary(&summary)?;
        Ok(summary)
    }

    async fn update_reviews(&self) -> Result<(usize, usize)> {
        let raws = self.provider.fetch_reviews().await?;
        let batch = normalize_batch(&raws);
        self.cache.store_reviews(&batch.reviews)?;
        gauge!("feefo_reviews_cached").set(batch.reviews.len() as f64);
        Ok((batch.reviews.len(), batch.skipped))
    }
}

fn busy(provider: &str, action: RefreshAction) -> RefreshOutcome {
    tracing::debug!(target: "feefo", provider, action = action.as_str(), "refresh already running, skipping");
    RefreshOutcome::Busy
}

fn record(provider: &str, action: RefreshAction, outcome: &RefreshOutcome) {
    let label = action.as_str();
    counter!("feefo_refresh_runs_total", "action" => label).increment(1);
    match outcome {
        RefreshOutcome::Failed { error } => {
            counter!("feefo_refresh_errors_total", "action" => label).increment(1);
            tracing::warn!(target: "feefo", provider, action = label, error = %error, "refresh failed, keeping cached values");
        }
        other => {
            let now = chrono::Utc::now().timestamp().max(0) as f64;
            gauge!("feefo_last_refresh_ts", "action" => label).set(now);
            tracing::info!(target: "feefo", provider, action = label, outcome = ?other, "refresh stored");
        }
    }
}

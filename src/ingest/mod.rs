// src/ingest/mod.rs
pub mod client;
pub mod fixture;
pub mod normalize;
pub mod refresh;
pub mod scheduler;
pub mod types;

pub use client::FeefoClient;
pub use normalize::{normalize, normalize_batch, NormalizedBatch};
pub use refresh::{CycleReport, RefreshAction, RefreshJob, RefreshOutcome};
pub use scheduler::{Cadence, ScheduleOutcome, Scheduler};
pub use types::{RatingSummary, RatingValue, RawReview, Review, ReviewRating, ReviewsProvider};

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feefo_refresh_runs_total",
            "Refresh actions executed, by action."
        );
        describe_counter!(
            "feefo_refresh_errors_total",
            "Refresh actions that failed and left the cache untouched."
        );
        describe_counter!(
            "feefo_reviews_skipped_total",
            "Reviews dropped by the normalizer as malformed."
        );
        describe_counter!("feefo_fetch_errors_total", "Feefo HTTP errors.");
        describe_histogram!("feefo_fetch_ms", "Feefo request time in milliseconds.");
        describe_gauge!("feefo_reviews_cached", "Reviews in the cached collection.");
        describe_gauge!(
            "feefo_last_refresh_ts",
            "Unix ts of the last successful refresh, by action."
        );
        describe_gauge!("feefo_refresh_period_secs", "Configured refresh cadence.");
    });
}

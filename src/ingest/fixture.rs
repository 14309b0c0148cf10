// src/ingest/fixture.rs
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::FeedError;
use crate::ingest::client::{parse_reviews, parse_summary};
use crate::ingest::types::{
    RatingSummary, RawReview, ReviewsProvider, REVIEWS_ENDPOINT, SUMMARY_ENDPOINT,
};

/// Provider that serves canned response bodies instead of calling Feefo.
/// Bodies go through the same parsing as live responses. Used by tests and
/// for running the service without network access.
pub struct FixtureProvider {
    summary: Mutex<Result<Value, FeedError>>,
    reviews: Mutex<Result<Value, FeedError>>,
    summary_calls: AtomicUsize,
    reviews_calls: AtomicUsize,
}

impl FixtureProvider {
    pub fn new(summary_body: Value, reviews_body: Value) -> Self {
        Self {
            summary: Mutex::new(Ok(summary_body)),
            reviews: Mutex::new(Ok(reviews_body)),
            summary_calls: AtomicUsize::new(0),
            reviews_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_summary(&self, body: Result<Value, FeedError>) {
        *self.summary.lock().unwrap_or_else(|p| p.into_inner()) = body;
    }

    pub fn set_reviews(&self, body: Result<Value, FeedError>) {
        *self.reviews.lock().unwrap_or_else(|p| p.into_inner()) = body;
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn reviews_calls(&self) -> usize {
        self.reviews_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewsProvider for FixtureProvider {
    async fn fetch_summary(&self) -> Result<RatingSummary, FeedError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.summary.lock().unwrap_or_else(|p| p.into_inner()).clone()?;
        parse_summary(SUMMARY_ENDPOINT, &body)
    }

    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, FeedError> {
        self.reviews_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.reviews.lock().unwrap_or_else(|p| p.into_inner()).clone()?;
        parse_reviews(REVIEWS_ENDPOINT, body)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

// src/ingest/client.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{header, Client};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::error::FeedError;
use crate::ingest::types::{
    RatingSummary, RawReview, ReviewsProvider, REVIEWS_ENDPOINT, SUMMARY_ENDPOINT,
};

const USER_AGENT: &str = concat!("feefo-product-schema/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Feefo reviews API.
#[derive(Clone)]
pub struct FeefoClient {
    client: Client,
    api_root: String,
    merchant_identifier: Option<String>,
    timeout: Duration,
}

impl FeefoClient {
    pub fn new(base_url: &str, api_version: &str) -> Self {
        let api_root = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            api_version.trim_matches('/')
        );
        Self {
            client: Client::new(),
            api_root,
            merchant_identifier: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let mut c = Self::new(&cfg.base_url, &cfg.api_version).with_timeout(cfg.request_timeout());
        if let Some(m) = &cfg.merchant_identifier {
            c = c.with_merchant(m.clone());
        }
        c
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_merchant(mut self, merchant_identifier: impl Into<String>) -> Self {
        self.merchant_identifier = Some(merchant_identifier.into());
        self
    }

    /// `{base}/{version}/{endpoint}`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_root, endpoint.trim_start_matches('/'))
    }

    /// GET an endpoint and decode the body as JSON.
    pub async fn fetch_json(&self, endpoint: &str) -> Result<Value, FeedError> {
        let url = self.endpoint_url(endpoint);
        let t0 = Instant::now();

        let mut req = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json");
        if let Some(m) = &self.merchant_identifier {
            req = req.query(&[("merchant_identifier", m.as_str())]);
        }

        let body = match req.send().await.and_then(|rsp| rsp.error_for_status()) {
            Ok(rsp) => rsp.text().await.map_err(|e| FeedError::fetch(endpoint, e))?,
            Err(e) => {
                tracing::warn!(target: "feefo", error = %e, endpoint, "feefo http error");
                counter!("feefo_fetch_errors_total").increment(1);
                return Err(FeedError::fetch(endpoint, e));
            }
        };

        histogram!("feefo_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        serde_json::from_str(&body).map_err(|e| FeedError::parse(endpoint, e))
    }
}

#[async_trait]
impl ReviewsProvider for FeefoClient {
    async fn fetch_summary(&self) -> Result<RatingSummary, FeedError> {
        let v = self.fetch_json(SUMMARY_ENDPOINT).await?;
        parse_summary(SUMMARY_ENDPOINT, &v)
    }

    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, FeedError> {
        let v = self.fetch_json(REVIEWS_ENDPOINT).await?;
        parse_reviews(REVIEWS_ENDPOINT, v)
    }

    fn name(&self) -> &'static str {
        "feefo"
    }
}

/// Pull `rating.rating` and `rating.service.count` out of a summary body.
pub fn parse_summary(endpoint: &str, v: &Value) -> Result<RatingSummary, FeedError> {
    let score = v
        .pointer("/rating/rating")
        .and_then(Value::as_f64)
        .ok_or_else(|| FeedError::parse(endpoint, "missing numeric `rating.rating`"))?;
    let count = v
        .pointer("/rating/service/count")
        .and_then(Value::as_u64)
        .ok_or_else(|| FeedError::parse(endpoint, "missing integer `rating.service.count`"))?;
    Ok(RatingSummary { score, count })
}

/// Pull the `reviews` array out of a reviews body. Elements are decoded one
/// at a time; a bad element is marked on its `RawReview`, not raised here.
pub fn parse_reviews(endpoint: &str, v: Value) -> Result<Vec<RawReview>, FeedError> {
    let reviews = match v {
        Value::Object(mut map) => map.remove("reviews"),
        _ => None,
    }
    .ok_or_else(|| FeedError::parse(endpoint, "missing field `reviews`"))?;

    match reviews {
        Value::Array(items) => Ok(items.into_iter().map(RawReview::from_value).collect()),
        other => Err(FeedError::parse(
            endpoint,
            format!("`reviews` is not an array: {other}"),
        )),
    }
}

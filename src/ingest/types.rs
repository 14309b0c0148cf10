// src/ingest/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FeedError;

pub const SUMMARY_ENDPOINT: &str = "reviews/summary/product";
pub const REVIEWS_ENDPOINT: &str = "reviews/product";

/// Aggregate product rating as reported by `reviews/summary/product`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub score: f64,
    pub count: u64,
}

/// Rating value forwarded exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Number(serde_json::Number),
    Text(String),
}

/// schema.org `Rating` attached to each review. Bounds are fixed strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRating {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(rename = "bestRating")]
    pub best_rating: String,
    /// `null` when the provider sent no rating for the product.
    #[serde(rename = "ratingValue")]
    pub rating_value: Option<RatingValue>,
    #[serde(rename = "worstRating")]
    pub worst_rating: String,
}

impl ReviewRating {
    pub fn new(rating_value: impl Into<Option<RatingValue>>) -> Self {
        Self {
            kind: "Rating".to_string(),
            best_rating: "5".to_string(),
            rating_value: rating_value.into(),
            worst_rating: "1".to_string(),
        }
    }
}

/// Normalized schema.org `Review`, the unit stored in the review collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "@type")]
    pub kind: String,
    pub author: String,
    #[serde(rename = "datePublished")]
    pub date_published: String,
    pub description: String,
    #[serde(rename = "reviewRating")]
    pub review_rating: ReviewRating,
}

// ---- Raw provider shapes (`reviews/product`) ----
// Every field is optional so one odd record never fails the whole page;
// the normalizer decides what is usable.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub customer: Option<RawCustomer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products: Vec<RawProductReview>,
    /// Set when this element of the `reviews` array could not be decoded.
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawReview {
    /// Decode one element of the `reviews` array. A record of the wrong shape
    /// comes back marked undecodable so the batch can skip it on its own.
    pub fn from_value(v: Value) -> Self {
        Self::deserialize(v).unwrap_or_else(|e| Self {
            decode_error: Some(e.to_string()),
            ..Self::default()
        })
    }
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCustomer {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProductReview {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub rating: Option<RawRating>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRating {
    #[serde(default)]
    pub rating: Option<RatingValue>,
}

/// Source of review data. Implemented by the HTTP client and by test stubs.
#[async_trait::async_trait]
pub trait ReviewsProvider: Send + Sync {
    async fn fetch_summary(&self) -> Result<RatingSummary, FeedError>;
    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, FeedError>;
    fn name(&self) -> &'static str;
}

// src/ingest/normalize.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use metrics::counter;

use crate::error::FeedError;
use crate::ingest::types::{RawReview, Review, ReviewRating};

pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Provider timestamp layouts, tried in order. Feefo sends `+HHMM` offsets.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Reduce a provider timestamp to its calendar date in the timestamp's own
/// offset (`2023-05-01T23:30:00-0500` stays `2023-05-01`). Timestamps without
/// an offset keep their written date.
pub fn date_only(ts: &str) -> Option<String> {
    let ts = ts.trim();
    let date = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(ts, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.date_naive())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(ts.get(..10)?, "%Y-%m-%d").ok())?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Turn one raw Feefo review into a schema.org `Review`.
///
/// Only the first linked product is read, and whatever it carries is
/// forwarded: no rating gives a `null` rating value, no usable timestamp an
/// empty date. A record without a product (or one that could not be decoded
/// at all) is rejected with `MalformedReview`.
pub fn normalize(raw: &RawReview) -> Result<Review, FeedError> {
    if let Some(e) = &raw.decode_error {
        return Err(FeedError::MalformedReview(format!("undecodable review: {e}")));
    }
    let product = raw
        .products
        .first()
        .ok_or_else(|| FeedError::MalformedReview("review has no linked product".into()))?;

    let rating_value = product.rating.as_ref().and_then(|r| r.rating.clone());

    let date_published = match product.created_at.as_deref() {
        Some(ts) => date_only(ts).unwrap_or_else(|| {
            tracing::debug!(target: "feefo", created_at = ts, "unparseable created_at");
            String::new()
        }),
        None => String::new(),
    };

    let author = raw
        .customer
        .as_ref()
        .and_then(|c| c.display_name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(ANONYMOUS_AUTHOR)
        .to_string();

    Ok(Review {
        kind: "Review".to_string(),
        author,
        date_published,
        description: product.review.clone().unwrap_or_default(),
        review_rating: ReviewRating::new(rating_value),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub reviews: Vec<Review>,
    pub skipped: usize,
}

/// Normalize a whole page in provider order. Malformed records are logged and
/// skipped; the rest of the batch always goes through.
pub fn normalize_batch(raws: &[RawReview]) -> NormalizedBatch {
    let mut out = NormalizedBatch {
        reviews: Vec::with_capacity(raws.len()),
        skipped: 0,
    };

    for (idx, raw) in raws.iter().enumerate() {
        match normalize(raw) {
            Ok(review) => out.reviews.push(review),
            Err(e) => {
                tracing::warn!(target: "feefo", index = idx, error = %e, "skipping review");
                out.skipped += 1;
            }
        }
    }

    if out.skipped > 0 {
        counter!("feefo_reviews_skipped_total").increment(out.skipped as u64);
    }
    out
}

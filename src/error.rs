// src/error.rs
use thiserror::Error;

/// Errors raised while pulling data from Feefo and shaping it for the cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Network failure or non-2xx status.
    #[error("fetch {endpoint} failed: {reason}")]
    Fetch { endpoint: String, reason: String },

    /// Body was not JSON, or an expected field is missing.
    #[error("parse {endpoint} failed: {reason}")]
    Parse { endpoint: String, reason: String },

    /// A review record that cannot be turned into a `Review`.
    #[error("malformed review: {0}")]
    MalformedReview(String),
}

impl FeedError {
    pub fn fetch(endpoint: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(endpoint: &str, reason: impl ToString) -> Self {
        Self::Parse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Parse { .. } => "parse",
            Self::MalformedReview(_) => "malformed_review",
        }
    }
}

/// Errors from the persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_endpoint_and_cause() {
        let e = FeedError::fetch("reviews/product", "connection refused");
        assert_eq!(
            e.to_string(),
            "fetch reviews/product failed: connection refused"
        );
        assert_eq!(e.kind(), "fetch");
    }

    #[test]
    fn kinds_are_distinct() {
        assert_eq!(FeedError::parse("x", "y").kind(), "parse");
        assert_eq!(
            FeedError::MalformedReview("no product".into()).kind(),
            "malformed_review"
        );
    }
}

// src/render.rs
//! Builds the GTM `dataLayer` payload from cached values.
//!
//! Rendering is read-only and synchronous: three cache reads, no network.
//! Absent values are omitted (score/count) or rendered empty (reviews).

use serde::Serialize;

use crate::ingest::types::Review;
use crate::store::FeedCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLayerPayload {
    #[serde(rename = "RatingScore", skip_serializing_if = "Option::is_none")]
    pub rating_score: Option<f64>,
    #[serde(rename = "RatingCount", skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    #[serde(rename = "Reviews")]
    pub reviews: Vec<Review>,
}

#[derive(Clone)]
pub struct PayloadRenderer {
    cache: FeedCache,
}

impl PayloadRenderer {
    pub fn new(cache: FeedCache) -> Self {
        Self { cache }
    }

    pub fn render(&self) -> DataLayerPayload {
        DataLayerPayload {
            rating_score: self.cache.rating_score(),
            rating_count: self.cache.rating_count(),
            reviews: self.cache.reviews().unwrap_or_default(),
        }
    }

    pub fn render_script(&self) -> String {
        script_block(&self.render())
    }
}

/// `<script>` block pushing `payload` onto `window.dataLayer`. Must be placed
/// before the GTM container script, which reads the layer on load.
pub fn script_block(payload: &DataLayerPayload) -> String {
    // Plain structs of strings and numbers; serde_json cannot fail here.
    let json = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    let json = html_escape::encode_script(&json);
    format!(
        "<script>\n    window.dataLayer = window.dataLayer || [];\n    window.dataLayer.push({json});\n</script>"
    )
}

/// Insert `snippet` right after the opening `<head>` tag so it precedes every
/// other head script. Documents without a `<head>` get it prepended.
pub fn inject_into_head(html: &str, snippet: &str) -> String {
    match head_open_end(html) {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + snippet.len() + 1);
            out.push_str(&html[..at]);
            out.push('\n');
            out.push_str(snippet);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{snippet}\n{html}"),
    }
}

/// Byte offset just past the `>` of the first `<head ...>` tag.
fn head_open_end(html: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lower[from..].find("<head") {
        let start = from + rel;
        let after = start + "<head".len();
        // skip <header>, <heading> and friends
        match lower[after..].chars().next() {
            Some(c) if c == '>' || c.is_ascii_whitespace() || c == '/' => {
                return lower[after..].find('>').map(|gt| after + gt + 1);
            }
            _ => from = after,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{RatingSummary, RatingValue, ReviewRating};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn renderer() -> (FeedCache, PayloadRenderer) {
        let cache = FeedCache::new(Arc::new(MemoryStore::new()), "feefo_data__");
        (cache.clone(), PayloadRenderer::new(cache))
    }

    fn review(text: &str) -> Review {
        Review {
            kind: "Review".into(),
            author: "anonymous".into(),
            date_published: "2023-05-01".into(),
            description: text.into(),
            review_rating: ReviewRating::new(RatingValue::Number(4u64.into())),
        }
    }

    #[test]
    fn empty_cache_renders_empty_reviews_and_no_scores() {
        let (_, r) = renderer();
        let v = serde_json::to_value(r.render()).unwrap();
        assert_eq!(v, json!({ "Reviews": [] }));
    }

    #[test]
    fn cached_values_render_under_datalayer_names() {
        let (cache, r) = renderer();
        cache
            .store_summary(&RatingSummary { score: 4.5, count: 12 })
            .unwrap();
        cache.store_reviews(&[review("Solid")]).unwrap();

        let v = serde_json::to_value(r.render()).unwrap();
        assert_eq!(v["RatingScore"], json!(4.5));
        assert_eq!(v["RatingCount"], json!(12));
        assert_eq!(v["Reviews"][0]["description"], json!("Solid"));
    }

    #[test]
    fn render_is_idempotent() {
        let (cache, r) = renderer();
        cache.store_reviews(&[review("x")]).unwrap();
        assert_eq!(r.render(), r.render());
        assert_eq!(r.render_script(), r.render_script());
    }

    #[test]
    fn script_pushes_onto_datalayer() {
        let (_, r) = renderer();
        let s = r.render_script();
        assert!(s.starts_with("<script>"));
        assert!(s.contains("window.dataLayer = window.dataLayer || [];"));
        assert!(s.contains(r#"window.dataLayer.push({"Reviews":[]});"#));
        assert!(s.ends_with("</script>"));
    }

    #[test]
    fn review_text_cannot_close_the_script() {
        let (cache, r) = renderer();
        cache
            .store_reviews(&[review("nice</script><script>alert(1)</script>")])
            .unwrap();
        let s = r.render_script();
        assert_eq!(s.matches("</script>").count(), 1);
    }

    #[test]
    fn injected_before_tag_manager() {
        let html = "<html><head>\n<script src=\"https://www.googletagmanager.com/gtm.js?id=GTM-X\"></script>\n</head><body></body></html>";
        let out = inject_into_head(html, "<script>/*layer*/</script>");
        let layer = out.find("/*layer*/").unwrap();
        let gtm = out.find("googletagmanager").unwrap();
        assert!(layer < gtm);
        assert!(out.starts_with("<html><head>\n<script>/*layer*/</script>"));
    }

    #[test]
    fn head_with_attributes_and_header_tags() {
        let html = "<body><header>x</header></body>";
        assert!(inject_into_head(html, "S").starts_with("S\n<body>"));

        let html = "<HTML><HEAD lang=\"en\"><title>t</title></HEAD></HTML>";
        let out = inject_into_head(html, "S");
        assert_eq!(out, "<HTML><HEAD lang=\"en\">\nS<title>t</title></HEAD></HTML>");
    }
}

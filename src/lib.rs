// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod render;
pub mod store;

pub use crate::app::App;
pub use crate::config::AppConfig;
pub use crate::error::{FeedError, StoreError};
pub use crate::render::{DataLayerPayload, PayloadRenderer};
pub use crate::store::{CacheStore, FeedCache, FileStore, MemoryStore};

// src/store.rs
//! Key-value persistence for the last good Feefo data.
//!
//! `CacheStore` is the raw `key -> JSON` contract. `FeedCache` layers the
//! prefixed key scheme and typed accessors on top of it; it is the only thing
//! the refresh actions and the renderer talk to.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::StoreError;
use crate::ingest::types::{RatingSummary, Review};

pub const KEY_RATING: &str = "summary_product_rating";
pub const KEY_RATING_COUNT: &str = "summary_product_rating_count";
pub const KEY_REVIEWS: &str = "reviews";

/// Synchronous, last-write-wins key-value store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Write every entry or none of them.
    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)])
    }
}

type Entries = BTreeMap<String, Value>;

/// Process-local store, used in tests and when no store path is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let g = self.entries.read().unwrap_or_else(|p| p.into_inner());
        g.get(key).cloned()
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut g = self.entries.write().unwrap_or_else(|p| p.into_inner());
        g.extend(entries);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Reads are served from memory. Every `set` rewrites the file through a
/// temp file + rename so a crash never leaves a half-written store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A missing file opens
    /// empty; an unreadable one opens empty with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str::<Entries>(&s).unwrap_or_else(|e| {
                tracing::warn!(target: "feefo", path = %path.display(), error = %e, "store file unreadable, starting empty");
                Entries::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => {
                tracing::warn!(target: "feefo", path = %path.display(), error = %e, "store file unreadable, starting empty");
                Entries::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let g = self.entries.read().unwrap_or_else(|p| p.into_inner());
        g.get(key).cloned()
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut g = self.entries.write().unwrap_or_else(|p| p.into_inner());
        let mut prev = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let old = g.insert(key.clone(), value);
            prev.push((key, old));
        }
        if let Err(e) = self.persist(&g) {
            // keep memory in line with what is on disk
            for (key, old) in prev.into_iter().rev() {
                match old {
                    Some(v) => g.insert(key, v),
                    None => g.remove(&key),
                };
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Typed view over a `CacheStore` using the `<prefix><suffix>` key scheme.
#[derive(Clone)]
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
    prefix: String,
}

impl FeedCache {
    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    pub fn rating_score(&self) -> Option<f64> {
        self.read(KEY_RATING)
    }

    pub fn rating_count(&self) -> Option<u64> {
        self.read(KEY_RATING_COUNT)
    }

    /// `None` until the first successful reviews refresh.
    pub fn reviews(&self) -> Option<Vec<Review>> {
        self.read(KEY_REVIEWS)
    }

    /// Score and count land together or not at all.
    pub fn store_summary(&self, summary: &RatingSummary) -> Result<(), StoreError> {
        self.store.set_many(vec![
            (self.key(KEY_RATING), serde_json::to_value(summary.score)?),
            (self.key(KEY_RATING_COUNT), serde_json::to_value(summary.count)?),
        ])
    }

    /// Replaces the whole collection.
    pub fn store_reviews(&self, reviews: &[Review]) -> Result<(), StoreError> {
        self.write(KEY_REVIEWS, reviews)
    }

    fn read<T: DeserializeOwned>(&self, suffix: &str) -> Option<T> {
        let key = self.key(suffix);
        let v = self.store.get(&key)?;
        match serde_json::from_value(v) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(target: "feefo", key = %key, error = %e, "cached value has unexpected type");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, suffix: &str, value: &T) -> Result<(), StoreError> {
        let v = serde_json::to_value(value)?;
        self.store.set(&self.key(suffix), v)
    }
}

// src/config/feefo.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::ingest::scheduler::Cadence;

pub const ENV_CONFIG_PATH: &str = "FEEFO_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/feefo.toml";

const ENV_MERCHANT: &str = "FEEFO_MERCHANT_IDENTIFIER";
const ENV_API_VERSION: &str = "FEEFO_API_VERSION";
const ENV_BIND_ADDR: &str = "FEEFO_BIND_ADDR";

/// Immutable service configuration. Built once at startup and handed to each
/// component by value or behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Feefo API root, without the version segment.
    pub base_url: String,
    pub api_version: String,
    /// Sent as `merchant_identifier` on every request when set.
    pub merchant_identifier: Option<String>,
    /// Prefix shared by every cache key.
    pub option_prefix: String,
    /// Identity of the recurring refresh job.
    pub job_id: String,
    pub cadence: Cadence,
    pub request_timeout_secs: u64,
    pub store_path: PathBuf,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.feefo.com/api".to_string(),
            api_version: "10".to_string(),
            merchant_identifier: None,
            option_prefix: "feefo_data__".to_string(),
            job_id: "product_schema_feefo_data_refresh".to_string(),
            cadence: Cadence::Daily,
            request_timeout_secs: 15,
            store_path: PathBuf::from("data/feefo_store.json"),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing feefo config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feefo config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load config using env var + fallbacks, then apply env overrides:
    /// 1) $FEEFO_CONFIG_PATH (must exist)
    /// 2) config/feefo.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_path(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from_path(&fallback)?
            } else {
                Self::default()
            }
        };

        let cfg = base.with_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(m) = non_empty_env(ENV_MERCHANT) {
            self.merchant_identifier = Some(m);
        }
        if let Some(v) = non_empty_env(ENV_API_VERSION) {
            self.api_version = v;
        }
        if let Some(a) = non_empty_env(ENV_BIND_ADDR) {
            self.bind_addr = a;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.api_version.trim().is_empty() {
            bail!("api_version must not be empty");
        }
        if self.job_id.trim().is_empty() {
            bail!("job_id must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

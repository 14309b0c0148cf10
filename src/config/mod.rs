// src/config/mod.rs
pub mod feefo;

pub use feefo::{AppConfig, ENV_CONFIG_PATH};

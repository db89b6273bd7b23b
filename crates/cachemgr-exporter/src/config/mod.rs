//! Exporter config loader (strict parsing, env overrides).

pub mod schema;

use std::fs;

use cachemgr_core::error::{CacheMgrError, Result};

pub use schema::{CacheMgrSection, ExporterConfig, ExporterSection};

/// Read, apply `CACHEMGR_*` environment overrides, validate.
pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CacheMgrError::BadConfig(format!("read config {path} failed: {e}")))?;
    load_with_env(&s, |name| std::env::var(name).ok())
}

/// Parse and validate without consulting the environment.
pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    load_with_env(s, |_| None)
}

pub fn load_with_env<F>(s: &str, lookup: F) -> Result<ExporterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| CacheMgrError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.cachemgr.apply_env(lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

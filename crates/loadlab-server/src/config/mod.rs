//! Service config loader (strict parsing, env overrides).
//!
//! Precedence, lowest first: built-in defaults, the YAML file named by
//! `LOADLAB_CONFIG`, then the `PORT` and `DATABASE_URL` environment variables.

pub mod schema;

use std::fs;

use loadlab_core::error::{LoadLabError, Result};

pub use schema::{DatabaseSection, SamplerSection, ServerSection, ServiceConfig, StatsSection};

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "LOADLAB_CONFIG";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| LoadLabError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| LoadLabError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the full config from the process environment.
pub fn load() -> Result<ServiceConfig> {
    load_with(|k| std::env::var(k).ok())
}

/// Resolve the full config using `lookup` for environment access.
pub fn load_with<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        Some(path) => load_from_file(&path)?,
        None => ServiceConfig::default(),
    };
    apply_env(&mut cfg, lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `PORT` / `DATABASE_URL` overrides. Empty values are ignored.
pub fn apply_env<F>(cfg: &mut ServiceConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(p) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
        cfg.server.port = p.trim().parse().map_err(|e| {
            LoadLabError::Config(format!("{PORT_ENV}={p:?} is not a valid port: {e}"))
        })?;
    }
    if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
        cfg.database.url = url;
    }
    Ok(())
}

//! Runtime configuration loaded from environment variables.
//!
//! DESIGN
//! ======
//! Numeric knobs follow the `env_parse` pattern: a missing or unparsable
//! value falls back to its default. Only the store base URL and the tenant
//! are required. The binary calls `dotenvy::dotenv()` first, so a local
//! `.env` file works too.

use std::path::PathBuf;
use std::time::Duration;

use crate::services::gateway::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::services::persistence::DEFAULT_DEBOUNCE_MS;
use crate::services::sync::{DEFAULT_SYNC_INITIAL_DELAY_MS, DEFAULT_SYNC_INTERVAL_SECS};

pub const BASE_URL_VAR: &str = "PAGEGRID_BASE_URL";
pub const TENANT_VAR: &str = "PAGEGRID_TENANT";
pub const CACHE_DIR_VAR: &str = "PAGEGRID_CACHE_DIR";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {var}")]
    Missing { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGridConfig {
    /// Remote store base URL, without a trailing slash.
    pub base_url: String,
    pub tenant: String,
    /// File cache directory. `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    pub cache_debounce: Duration,
    pub sync_interval: Duration,
    pub sync_initial_delay: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl PageGridConfig {
    /// Build the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Missing` if the base URL or tenant is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: required(BASE_URL_VAR)?.trim_end_matches('/').to_owned(),
            tenant: required(TENANT_VAR)?,
            cache_dir: optional(CACHE_DIR_VAR).map(PathBuf::from),
            cache_debounce: Duration::from_millis(env_parse("PAGEGRID_CACHE_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)),
            sync_interval: Duration::from_secs(env_parse("PAGEGRID_SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)),
            sync_initial_delay: Duration::from_millis(env_parse(
                "PAGEGRID_SYNC_INITIAL_DELAY_MS",
                DEFAULT_SYNC_INITIAL_DELAY_MS,
            )),
            request_timeout: Duration::from_secs(env_parse(
                "PAGEGRID_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(env_parse(
                "PAGEGRID_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Non-blank value of `key`, trimmed.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing { var: key })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

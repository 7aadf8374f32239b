//! Daemon settings: a JSON config file plus environment overrides
//!
//! - `DDNS_CONFIG`: path to the JSON file (default `/etc/ddnsd/config.json`)
//! - `DDNS_LOGIN_TOKEN`: provider login token
//! - `DDNS_IP_URL`: public IP lookup URL
//! - `DDNS_SOCKS5_PROXY`: SOCKS5 proxy for provider traffic
//! - `DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)

use anyhow::{Context, Result};
use ddns_core::DdnsConfig;
use std::path::PathBuf;
use tracing::Level;

/// Config file used when `DDNS_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ddnsd/config.json";

/// Everything the daemon needs before it starts any loop
#[derive(Debug)]
pub struct Settings {
    pub config_path: PathBuf,
    pub config: DdnsConfig,
    pub log_level: Level,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings using `lookup` to read environment variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = PathBuf::from(
            lookup("DDNS_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
        );

        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let mut config: DdnsConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

        if let Some(token) = non_empty(lookup("DDNS_LOGIN_TOKEN")) {
            config.login_token = token;
        }
        if let Some(url) = non_empty(lookup("DDNS_IP_URL")) {
            config.ip_url = url;
        }
        if let Some(proxy) = non_empty(lookup("DDNS_SOCKS5_PROXY")) {
            config.socks5_proxy = Some(proxy);
        }

        let log_level = match lookup("DDNS_LOG_LEVEL") {
            Some(level) => parse_level(&level).ok_or_else(|| {
                anyhow::anyhow!(
                    "DDNS_LOG_LEVEL '{}' is not valid. \
                    Valid levels: trace, debug, info, warn, error",
                    level
                )
            })?,
            None => Level::INFO,
        };

        config.validate()?;

        Ok(Self {
            config_path,
            config,
            log_level,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

//! Application configuration
//!
//! Everything is read from the environment; only the server URL is required.

use anyhow::{bail, Context};
use auth_client::ClientConfig;
use std::path::PathBuf;

/// Environment variable with the log filter
pub const LOG_ENV: &str = "OUTFIT_PLANNER_LOG";

/// Environment variable toggling the demo password-reset flow
pub const DEMO_RESET_ENV: &str = "OUTFIT_PLANNER_DEMO_RESET";

/// Environment variable with the session store file path
pub const STORE_PATH_ENV: &str = "OUTFIT_PLANNER_STORE_PATH";

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default session store file
pub const DEFAULT_STORE_PATH: &str = "outfit_planner_session.json";

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Auth client settings
    pub client: ClientConfig,
    /// Where the session credentials are kept
    pub store_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Serve the reset-code screens from the built-in demo flow
    pub demo_reset: bool,
}

impl AppConfig {
    /// Configuration with defaults around a client config
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            demo_reset: true,
        }
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client = ClientConfig::from_lookup(&lookup).context("invalid auth client configuration")?;
        let mut config = Self::new(client);

        if let Some(path) = value(STORE_PATH_ENV) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(filter) = value(LOG_ENV) {
            config.log_filter = filter;
        }
        if let Some(flag) = value(DEMO_RESET_ENV) {
            config.demo_reset = parse_flag(&flag).with_context(|| format!("invalid {DEMO_RESET_ENV}"))?;
        }

        Ok(config)
    }

    /// Set the session store path
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Set the log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Enable or disable the demo reset flow
    pub fn with_demo_reset(mut self, enabled: bool) -> Self {
        self.demo_reset = enabled;
        self
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_client::config::SERVER_URL_ENV;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(lookup(&[(SERVER_URL_ENV, "https://api.example.com")])).unwrap();
        assert_eq!(config.client.base_url, "https://api.example.com");
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.log_filter, "info");
        assert!(config.demo_reset);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (SERVER_URL_ENV, "https://api.example.com"),
            (STORE_PATH_ENV, "/tmp/session.json"),
            (LOG_ENV, "debug"),
            (DEMO_RESET_ENV, "off"),
        ]))
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.log_filter, "debug");
        assert!(!config.demo_reset);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[
            (SERVER_URL_ENV, "https://api.example.com"),
            (LOG_ENV, ""),
            (DEMO_RESET_ENV, "  "),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "info");
        assert!(config.demo_reset);
    }

    #[test]
    fn test_missing_server_url() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_bad_flag() {
        let err = AppConfig::from_lookup(lookup(&[
            (SERVER_URL_ENV, "https://api.example.com"),
            (DEMO_RESET_ENV, "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(DEMO_RESET_ENV));
    }
}

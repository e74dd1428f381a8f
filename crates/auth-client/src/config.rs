//! Client configuration
//!
//! The only external surface is the base URL of the auth service; everything
//! else has a working default.

use std::collections::HashMap;
use std::time::Duration;

use crate::{Error, Result};

/// Environment variable holding the auth service base URL
pub const SERVER_URL_ENV: &str = "OUTFIT_PLANNER_SERVER_URL";

/// Environment variable overriding the secure-store key prefix
pub const STORAGE_PREFIX_ENV: &str = "OUTFIT_PLANNER_STORAGE_PREFIX";

/// Default path under the base URL where the auth endpoints live
pub const DEFAULT_AUTH_PATH: &str = "/api/auth";

/// Default secure-store key prefix (the app scheme)
pub const DEFAULT_STORAGE_PREFIX: &str = "outfitplanner";

/// Configuration for the auth HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base service URL (e.g., "https://api.outfitplanner.app")
    pub base_url: String,
    /// Path prefix of the auth endpoints
    pub auth_path: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
    /// Prefix for keys written to the secure store
    pub storage_prefix: String,
}

impl ClientConfig {
    /// Create a new config for a base URL
    ///
    /// The URL must be absolute http(s); a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("OutfitPlanner/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
        })
    }

    /// Build the config from the process environment
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = non_empty(SERVER_URL_ENV)
            .ok_or_else(|| Error::Config(format!("{SERVER_URL_ENV} is not set")))?;

        let mut config = Self::new(base_url)?;
        if let Some(prefix) = non_empty(STORAGE_PREFIX_ENV) {
            config.storage_prefix = prefix;
        }
        Ok(config)
    }

    /// Set the auth endpoint path prefix
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        self.auth_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the secure-store key prefix
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Full URL of an auth endpoint
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.auth_path,
            path.trim_start_matches('/')
        )
    }

    /// Secure-store key for a named item
    pub fn storage_key(&self, item: &str) -> String {
        format!("{}_{}", self.storage_prefix, item)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("invalid server url {raw:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::Config(format!(
                "server url must be http or https, got {other}"
            )))
        }
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

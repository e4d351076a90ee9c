//! Application configuration management.
//!
//! This module handles loading the client configuration: backend base URL,
//! retry policy, request timeout, and where the bearer token lives.
//!
//! Configuration is stored at `~/.config/userstore/config.json`. Every field
//! is optional in the file, and `USERSTORE_*` environment variables override
//! whatever the file says.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenProvider};

/// Application name used for config directory paths
const APP_NAME: &str = "userstore";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend the client talks to when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

/// Total attempts per request, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between a failed attempt and the next one
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;

/// HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "USERSTORE_BASE_URL";
pub const ENV_MAX_ATTEMPTS: &str = "USERSTORE_MAX_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "USERSTORE_RETRY_DELAY_MS";
pub const ENV_TOKEN: &str = "USERSTORE_TOKEN";

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry ceiling: total attempts, never less than one
    pub max_attempts: u32,
    /// Pause after a failed attempt that will be retried
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub token_source: TokenSource,
    /// Overrides the default `tokens.json` location
    pub token_file: Option<PathBuf>,
    /// Static token from the environment; never written to disk
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_source: TokenSource::File,
            token_file: None,
            token: None,
        }
    }
}

impl Config {
    /// Load from the default config path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `USERSTORE_*` overrides, reading values through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(attempts) = lookup(ENV_MAX_ATTEMPTS) {
            let attempts: u32 = attempts
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer", ENV_MAX_ATTEMPTS))?;
            if attempts == 0 {
                anyhow::bail!("{} must be a positive integer, got 0", ENV_MAX_ATTEMPTS);
            }
            self.max_attempts = attempts;
        }
        if let Some(delay) = lookup(ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", ENV_RETRY_DELAY_MS))?;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL parsed and normalized to end in `/`
    pub fn base_url(&self) -> Result<Url> {
        normalize_base_url(&self.base_url)
    }

    pub fn token_file_store(&self) -> Result<FileTokenStore> {
        match self.token_file {
            Some(ref path) => Ok(FileTokenStore::new(path)),
            None => Ok(FileTokenStore::in_dir(&Self::config_dir()?)),
        }
    }

    /// Token source the API client reads from on every request
    pub fn token_provider(&self) -> Result<Arc<dyn TokenProvider>> {
        if let Some(ref token) = self.token {
            return Ok(Arc::new(MemoryTokenStore::new(token.clone())));
        }
        Ok(match self.token_source {
            TokenSource::File => Arc::new(self.token_file_store()?),
            TokenSource::Keyring => Arc::new(KeyringTokenStore::default()),
        })
    }
}

/// Parse a base URL, making sure relative joins land under it
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid base URL: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `<scheme>://<host>/` for the origin `page_url` was served from
pub fn base_url_from_origin(page_url: &str) -> Result<Url> {
    let url = Url::parse(page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL has no host: {}", page_url))?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };
    Ok(Url::parse(&origin)?)
}

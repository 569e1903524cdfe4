//! Settings and configuration file handling
//!
//! Settings come from `config.toml` in the config directory, then from
//! `ZENODO_*` environment variables. The CLI applies its flags last.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const PRODUCTION_URL: &str = "https://zenodo.org";
pub const SANDBOX_URL: &str = "https://sandbox.zenodo.org";

pub const ENV_ACCESS_TOKEN: &str = "ZENODO_ACCESS_TOKEN";
pub const ENV_RESTRICTED_ACCESS_TOKEN: &str = "ZENODO_RESTRICTED_ACCESS_TOKEN";
pub const ENV_SANDBOX: &str = "ZENODO_SANDBOX";
pub const ENV_ENDPOINT: &str = "ZENODO_ENDPOINT";
pub const ENV_CONFIG_DIR: &str = "ZS_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Retry policy applied by hosts around fallible calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// Connection settings for one Zenodo instance
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Personal access token
    pub access_token: Option<String>,

    /// Token granting access to restricted records
    pub restricted_access_token: Option<String>,

    /// Use sandbox.zenodo.org instead of production
    pub sandbox: bool,

    /// Explicit base URL, overrides `sandbox`
    pub endpoint: Option<String>,

    pub retry: RetryConfig,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field(
                "restricted_access_token",
                &self.restricted_access_token.as_ref().map(|_| "***"),
            )
            .field("sandbox", &self.sandbox)
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Settings {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    /// Access token, or a configuration error when it is missing
    pub fn access_token(&self) -> Result<&str> {
        match self.access_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::Config(format!(
                "Zenodo personal access token must be given as 'access_token' \
                 (or {ENV_ACCESS_TOKEN}). A separate registration and access token is \
                 needed for the sandbox environment at {SANDBOX_URL}."
            ))),
        }
    }

    /// Base URL of the selected instance, without trailing slash
    pub fn base_url(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(endpoint) => endpoint.trim_end_matches('/'),
            None if self.sandbox => SANDBOX_URL,
            None => PRODUCTION_URL,
        }
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.access_token = Some(token);
        }
        if let Some(token) = lookup(ENV_RESTRICTED_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.restricted_access_token = Some(token);
        }
        if let Some(flag) = lookup(ENV_SANDBOX) {
            self.sandbox = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        self
    }
}

/// Loads and saves `config.toml`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default location
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(ENV_CONFIG_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?
                .join("zs"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

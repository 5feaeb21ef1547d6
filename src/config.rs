//! Configuration loading and management
//!
//! Handles parsing of `.readyq.toml` configuration files. Every value has a
//! default, so a missing file behaves like an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".readyq.toml";

/// Default document path
pub const DEFAULT_DB_FILE: &str = ".readyq.md";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where the document lives and how writers coordinate on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the markdown document
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a writer waits for the lock before giving up
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Sleep between lock attempts
    #[serde(default = "default_lock_retry_ms")]
    pub lock_retry_ms: u64,
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE)
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

fn default_lock_retry_ms() -> u64 {
    crate::lock::LOCK_RETRY_INTERVAL_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
            lock_retry_ms: default_lock_retry_ms(),
        }
    }
}

impl StoreConfig {
    /// Store configuration for a specific document, other values defaulted
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sidecar marker guarding the document
    pub fn lock_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.lock", self.path.display()))
    }

    /// Sibling path of the line-delimited JSON document this one replaced
    pub fn legacy_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        match raw.strip_suffix(".md") {
            Some(stem) => PathBuf::from(format!("{stem}.jsonl")),
            None => PathBuf::from(format!("{raw}.jsonl")),
        }
    }

    /// Where the legacy document is copied before migration
    pub fn legacy_backup_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.backup", self.legacy_path().display()))
    }

    fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("store.path cannot be empty".to_string()));
        }
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.lock_retry_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_retry_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    ///
    /// A broken config file is logged and ignored so that the task document
    /// itself stays reachable.
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.store.validate()
    }
}

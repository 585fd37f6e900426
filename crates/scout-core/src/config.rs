//! Configuration management for OSINT Scout.
//!
//! Provides TOML-based configuration with XDG-compliant paths, environment
//! variable overrides and a shared [`SettingsStore`] that network components
//! read at call time.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/scout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Outbound request pacing, retries and timeouts
    pub network: NetworkConfig,
    /// Ethics gate settings
    pub ethics: EthicsConfig,
    /// Data source tier policy
    pub sources: SourcesConfig,
    /// Response cache settings
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCOUT_MAX_CONCURRENT_REQUESTS`: Override the in-flight request cap
    /// - `SCOUT_MIN_DELAY_SECS`: Override the minimum delay between requests
    /// - `SCOUT_RETRY_LIMIT`: Override the number of retries per request
    /// - `SCOUT_FREE_SOURCES_ONLY`: Restrict scans to free-tier modules (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `SCOUT_*` overrides obtained through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SCOUT_MAX_CONCURRENT_REQUESTS") {
            match val.parse() {
                Ok(max) => {
                    self.network.max_concurrent_requests = max;
                    tracing::debug!("Override network.max_concurrent_requests from env: {}", max);
                }
                Err(_) => tracing::warn!("Ignoring SCOUT_MAX_CONCURRENT_REQUESTS={val:?}"),
            }
        }

        if let Some(val) = lookup("SCOUT_MIN_DELAY_SECS") {
            match val.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    self.network.minimum_delay_secs = secs;
                    tracing::debug!("Override network.minimum_delay_secs from env: {}", secs);
                }
                _ => tracing::warn!("Ignoring SCOUT_MIN_DELAY_SECS={val:?}"),
            }
        }

        if let Some(val) = lookup("SCOUT_RETRY_LIMIT") {
            match val.parse() {
                Ok(limit) => {
                    self.network.retry_limit = limit;
                    tracing::debug!("Override network.retry_limit from env: {}", limit);
                }
                Err(_) => tracing::warn!("Ignoring SCOUT_RETRY_LIMIT={val:?}"),
            }
        }

        if let Some(val) = lookup("SCOUT_FREE_SOURCES_ONLY") {
            match val.parse() {
                Ok(free_only) => {
                    self.sources.free_sources_only = free_only;
                    tracing::debug!("Override sources.free_sources_only from env: {}", free_only);
                }
                Err(_) => tracing::warn!("Ignoring SCOUT_FREE_SOURCES_ONLY={val:?}"),
            }
        }
    }

    /// Reject values that would make the network layer misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        let delay = self.network.minimum_delay_secs;
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "network.minimum_delay_secs".to_string(),
                reason: format!("must be a non-negative number, got {delay}"),
            });
        }
        if self.network.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "network.user_agent".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/scout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the cache directory path.
    ///
    /// Uses XDG base directories: `~/.cache/scout`
    pub fn cache_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.cache_dir().to_path_buf())
    }

    /// Resolved location of the response cache database.
    pub fn cache_db_path(&self) -> ConfigResult<PathBuf> {
        match &self.cache.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::cache_dir()?.join("cache.sqlite")),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "osint-scout", "scout").ok_or(ConfigError::NoConfigDir)
}

/// Outbound request settings, read by the rate limiter and fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum requests in flight at once
    pub max_concurrent_requests: usize,
    /// Minimum delay between the end of one request and the start of the next
    pub minimum_delay_secs: f64,
    /// Additional attempts after a transient failure or HTTP 429
    pub retry_limit: u32,
    /// TCP/TLS connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds
    pub total_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl NetworkConfig {
    /// Minimum inter-request delay; negative or non-finite values count as zero.
    #[must_use]
    pub fn minimum_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.minimum_delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Effective in-flight cap, never below one.
    #[must_use]
    pub fn concurrency_cap(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Total timeout as a [`Duration`].
    #[must_use]
    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            minimum_delay_secs: 0.5,
            retry_limit: 2,
            connect_timeout_secs: 12,
            total_timeout_secs: 20,
            user_agent: "OSINT-Scout/1.0 (research)".to_string(),
        }
    }
}

/// Ethics gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthicsConfig {
    /// Master switch for ethical-use restrictions
    pub ethical_mode: bool,
    /// Reject targets that look like phone numbers, street addresses or ID numbers
    pub block_sensitive_patterns: bool,
}

impl Default for EthicsConfig {
    fn default() -> Self {
        Self {
            ethical_mode: true,
            block_sensitive_patterns: true,
        }
    }
}

/// Data source tier policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Only run modules backed by free sources
    pub free_sources_only: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            free_sources_only: true,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether modules may read and write cached results
    pub enabled: bool,
    /// Database location override; defaults to the platform cache directory
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Shared, live-updatable settings handle.
///
/// Readers always receive an owned copy, so a concurrent [`update`](Self::update)
/// never changes a decision already in progress.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    inner: Arc<RwLock<AppConfig>>,
}

impl SettingsStore {
    /// Wrap a configuration in a shared store.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the whole configuration.
    #[must_use]
    pub fn snapshot(&self) -> AppConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy of the network section.
    #[must_use]
    pub fn network(&self) -> NetworkConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .network
            .clone()
    }

    /// Mutate the configuration in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

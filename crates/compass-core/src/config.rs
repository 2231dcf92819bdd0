//! Configuration types for the cache, memory, and routing layers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Complete workspace configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct CompassConfig {
    /// Cache layer configuration.
    pub cache: CacheConfig,
    /// Memory layer configuration.
    pub memory: MemoryConfig,
    /// Routing thresholds and limits.
    pub router: RouterConfig,
    /// API keys for outbound providers.
    pub api_keys: ApiKeys,
}

/// API keys for outbound providers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeys {
    /// Key for the specialist analysis service.
    pub analysis_api_key: Option<String>,
}

/// Cache layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Base URL of the durable key/value store. `None` runs local-only.
    pub remote_url: Option<String>,
    /// Connect timeout for the remote store, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-command timeout for the remote store, in milliseconds.
    pub command_timeout_ms: u64,
    /// Maximum entry count of the in-process fallback map.
    pub max_local_entries: usize,
    /// Minimum interval between remote re-probe attempts, in seconds.
    pub reprobe_interval_secs: u64,
    /// Number of connection attempts per probe.
    pub probe_attempts: u32,
    /// Delay between probe attempts, in milliseconds.
    pub probe_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            connect_timeout_ms: 1_500,
            command_timeout_ms: 2_500,
            max_local_entries: 1_000,
            reprobe_interval_secs: 30,
            probe_attempts: 3,
            probe_delay_ms: 500,
        }
    }
}

/// Memory layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum semantic facts returned per context assembly.
    pub max_facts: usize,
    /// Maximum episodes returned per context assembly.
    pub max_episodes: usize,
    /// Cap on per-user index length; older entries fall off.
    pub index_cap: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_facts: 5,
            max_episodes: 3,
            index_cap: 100,
        }
    }
}

/// Routing thresholds and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Load above which the primary agent is considered overloaded.
    pub high_load_threshold: f64,
    /// Load below which a fallback agent may take over as primary.
    pub low_load_threshold: f64,
    /// TTL of the cached capability snapshot, in seconds.
    pub registry_snapshot_ttl_secs: u64,
    /// Maximum number of alternative strategies to generate.
    pub max_alternatives: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            high_load_threshold: 0.8,
            low_load_threshold: 0.5,
            registry_snapshot_ttl_secs: 180,
            max_alternatives: 3,
        }
    }
}

impl CompassConfig {
    /// Get the default config directory path (`~/.compass`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        use dirs::home_dir;
        let home = home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".compass"))
    }

    /// Get the default config file path (`~/.compass/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location (`~/.compass/config.toml`).
    /// If the config doesn't exist, creates it with default values.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        use toml::from_str;
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        from_str(&contents)
            .map_err(|error| Error::Config(format!("Failed to parse config: {error}")))
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        use toml::to_string_pretty;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Compass Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Get the analysis API key, checking config first, then the
    /// `COMPASS_ANALYSIS_API_KEY` environment variable.
    pub fn analysis_api_key(&self) -> Option<String> {
        self.api_keys
            .analysis_api_key
            .clone()
            .or_else(|| env::var("COMPASS_ANALYSIS_API_KEY").ok())
    }
}

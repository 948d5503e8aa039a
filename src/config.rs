//! Application configuration management.
//!
//! Persisted defaults for scan filters and cache maintenance, loaded from
//! a platform-specific config file. CLI flags always override these
//! values; the file only supplies defaults for flags left unset.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Minimum file size in bytes for duplicate consideration.
    #[serde(default)]
    pub min_file_size: u64,
    /// Minimum files a directory subtree must hold to be a duplicate
    /// candidate.
    #[serde(default = "default_min_dir_files")]
    pub min_dir_files: u64,
    /// Minimum subtree size in bytes for directory candidates.
    #[serde(default)]
    pub min_dir_size: u64,
    /// Age threshold in days for cache cleanup.
    #[serde(default = "default_cache_max_age_days")]
    pub cache_max_age_days: u64,
}

fn default_min_dir_files() -> u64 {
    2
}

fn default_cache_max_age_days() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_file_size: 0,
            min_dir_files: default_min_dir_files(),
            min_dir_size: 0,
            cache_max_age_days: default_cache_max_age_days(),
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "treedupe", "treedupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

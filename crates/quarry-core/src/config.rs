//! Configuration management for Quarry.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{QuarryError, Result};
use crate::search::SearchOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure for Quarry.
///
/// ## Example Configuration File (quarry.toml)
///
/// ```toml
/// [general]
/// max_results = 20
/// catalog_path = "/home/me/Music/library.json"
///
/// [search]
/// debounce_ms = 300
/// parallel_search = true
///
/// [library]
/// monitor = true
/// settle_ms = 500
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Search tuning
    pub search: SearchConfig,

    /// Library monitoring
    pub library: LibraryConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Maximum number of search results to show
    pub max_results: usize,

    /// Record catalog location (None = default location)
    pub catalog_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            max_results: 20,
            catalog_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before searching
    pub debounce_ms: u64,

    /// Use parallel search for large indices
    pub parallel_search: bool,

    /// Node count at which the parallel walk kicks in
    pub parallel_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            debounce_ms: 300,
            parallel_search: true,
            parallel_threshold: 10000,
        }
    }
}

/// Library monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Watch the catalog for changes in interactive mode
    pub monitor: bool,

    /// Quiet period after the last change before rebuilding
    pub settle_ms: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            monitor: false,
            settle_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| QuarryError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self)
            .map_err(|e| QuarryError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.general.max_results == 0 {
            return Err(QuarryError::config("general.max_results must be at least 1"));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "quarry")
            .ok_or_else(|| QuarryError::config("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("quarry.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "quarry")
            .ok_or_else(|| QuarryError::config("Could not determine data directory"))?;

        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the catalog path (from config or default).
    pub fn catalog_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.general.catalog_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_data_dir()?.join("library.json"))
        }
    }

    /// Search options derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.general.max_results.max(1),
            parallel: self.search.parallel_search,
            parallel_threshold: self.search.parallel_threshold,
        }
    }

    /// Quiet period before a typed query is searched
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }

    /// Quiet period after a catalog change before rebuilding
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.library.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.max_results, 20);
        assert_eq!(config.search.debounce_ms, 300);
        assert!(!config.library.monitor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.general.max_results = 50;
        config.general.catalog_path = Some(PathBuf::from("/music/library.json"));
        config.library.monitor = true;

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.general.max_results, 50);
        assert_eq!(
            loaded.catalog_path().unwrap(),
            PathBuf::from("/music/library.json")
        );
        assert!(loaded.library.monitor);
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.general.max_results, 20); // Default value
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[search]\ndebounce_ms = 150\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.debounce_ms, 150);
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.general.max_results, 20);
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[general]\nmax_results = 0\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(matches!(err, QuarryError::ConfigError { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[general\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_search_options() {
        let mut config = Config::default();
        config.general.max_results = 7;
        config.search.parallel_search = false;

        let options = config.search_options();
        assert_eq!(options.max_results, 7);
        assert!(!options.parallel);
        assert_eq!(options.parallel_threshold, 10000);
    }
}

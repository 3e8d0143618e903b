//! Configuration module for the sync client.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RS_` and use double underscores
//! to separate nested levels:
//! - `RS_ROOT=/srv/sync` sets `root`
//! - `RS_WATCHER__BATCH_WINDOW_MS=250` sets `watcher.batch_window_ms`
//! - `RS_REPOSITORIES__SERIALIZE_ACTIVITY=false` sets `repositories.serialize_activity`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name searched for in the current directory's ancestors.
const WORKSPACE_DIR: &str = ".reposync";
const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "RS_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Watched root; every top-level directory below it is a repository
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Watcher batching configuration
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Repository lifecycle configuration
    #[serde(default)]
    pub repositories: RepositoriesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatcherConfig {
    /// How long the delivery thread keeps collecting events into one batch
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoriesConfig {
    /// Interval between scans of the root for added/removed repositories
    #[serde(default = "default_rescan_interval_secs")]
    pub rescan_interval_secs: u64,

    /// Run overlapping notifications for one repository one at a time
    #[serde(default = "default_true")]
    pub serialize_activity: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `"reposync::activity" = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("RepoSync")
}
fn default_batch_window_ms() -> u64 {
    100
}
fn default_rescan_interval_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            root: default_root(),
            watcher: WatcherConfig::default(),
            repositories: RepositoriesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            batch_window_ms: default_batch_window_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}

impl Default for RepositoriesConfig {
    fn default() -> Self {
        Self {
            rescan_interval_secs: default_rescan_interval_secs(),
            serialize_activity: true,
        }
    }
}

impl RepositoriesConfig {
    pub fn rescan_interval(&self) -> Duration {
        // tokio's interval panics on a zero period
        Duration::from_secs(self.rescan_interval_secs.max(1))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific file, still honoring `RS_` overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting levels; single underscore stays
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Path of the settings file `load` reads.
    ///
    /// A `.reposync/` directory in the current directory or an ancestor wins
    /// over the per-user config directory.
    pub fn config_path() -> PathBuf {
        Self::find_workspace_config()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("reposync").join(SETTINGS_FILE)))
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join(SETTINGS_FILE))
    }

    /// Find a `.reposync` directory from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(WORKSPACE_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file at `path`
    pub fn init_config_file(
        path: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = path.as_ref().to_path_buf();

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.root.ends_with("RepoSync"));
        assert_eq!(settings.watcher.batch_window_ms, 100);
        assert!(settings.repositories.serialize_activity);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
root = "/srv/sync"

[watcher]
batch_window_ms = 250

[repositories]
rescan_interval_secs = 30
serialize_activity = false

[logging]
default = "info"

[logging.modules]
"reposync::activity" = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.root, PathBuf::from("/srv/sync"));
        assert_eq!(settings.watcher.batch_window(), Duration::from_millis(250));
        assert_eq!(settings.repositories.rescan_interval_secs, 30);
        assert!(!settings.repositories.serialize_activity);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(settings.logging.modules["reposync::activity"], "debug");
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(&config_path, "[watcher]\nbatch_window_ms = 20\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified value
        assert_eq!(settings.watcher.batch_window_ms, 20);

        // Everything else falls back to defaults
        assert_eq!(settings.version, 1);
        assert_eq!(settings.repositories.rescan_interval_secs, 5);
        assert!(settings.repositories.serialize_activity);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.watcher.batch_window_ms, 100);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.root = PathBuf::from("/tmp/reposync-root");
        settings.watcher.batch_window_ms = 42;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.root, PathBuf::from("/tmp/reposync-root"));
        assert_eq!(loaded.watcher.batch_window_ms, 42);
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        Settings::init_config_file(&config_path, false).unwrap();
        assert!(Settings::init_config_file(&config_path, false).is_err());
        assert!(Settings::init_config_file(&config_path, true).is_ok());
    }

    #[test]
    fn test_zero_rescan_interval_is_clamped() {
        let config = RepositoriesConfig {
            rescan_interval_secs: 0,
            serialize_activity: true,
        };
        assert_eq!(config.rescan_interval(), Duration::from_secs(1));
    }
}

//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the snapshot file.
    pub data_path: PathBuf,

    /// Write a snapshot after every change.
    pub save_to_file: bool,

    /// Timers created when a session starts without resuming.
    pub default_timers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_path: data_dir.join("chronometer.json"),
            save_to_file: true,
            default_timers: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WW_*)
        figment = figment.merge(Env::prefixed("WW_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for ww.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ww"))
}

/// Returns the platform-specific data directory for ww.
///
/// On Linux: `~/.local/share/ww`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ww"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirs_data_path_ends_with_ww() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "ww");
    }

    #[test]
    fn default_config_uses_data_dir_for_snapshot() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.data_path, data_dir.join("chronometer.json"));
        assert!(config.save_to_file);
        assert!(config.default_timers.is_empty());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "save_to_file = false\ndefault_timers = [\"mgmt\", \"review\"]\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert!(!config.save_to_file);
        assert_eq!(config.default_timers, vec!["mgmt", "review"]);
    }
}

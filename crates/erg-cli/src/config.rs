//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Where raw logs are written while an import is in progress.
    pub temp_folder: PathBuf,
    /// Where raw logs are archived once their activity is saved.
    pub workout_folder: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("erg.db"),
            temp_folder: data_dir.join("tmp"),
            workout_folder: data_dir.join("workouts"),
        }
    }
}

impl Config {
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

        // Load from environment variables (ERG_*)
        figment = figment.merge(Env::prefixed("ERG_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for erg.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("erg"))
}

/// Returns the platform-specific data directory for erg.
///
/// On Linux: `~/.local/share/erg`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("erg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_erg() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "erg");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("erg.db"));
        assert_eq!(config.temp_folder, data_dir.join("tmp"));
        assert_eq!(config.workout_folder, data_dir.join("workouts"));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "temp_folder = \"/data/erg/incoming\"\nworkout_folder = \"/data/erg/archive\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.temp_folder, PathBuf::from("/data/erg/incoming"));
        assert_eq!(config.workout_folder, PathBuf::from("/data/erg/archive"));
    }
}

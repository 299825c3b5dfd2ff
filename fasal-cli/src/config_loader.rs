//! Persistent CLI configuration.
//!
//! Loaded from `~/.config/fasal-rakshak/config.toml` on Linux,
//! `~/Library/Application Support/fasal-rakshak/config.toml` on macOS or
//! `%APPDATA%\fasal-rakshak\config.toml` on Windows.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_LISTEN_PORT: u16 = 5000;

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliConfig {
    /// SQLite URL, e.g. `sqlite:/home/me/fasal.db?mode=rwc`.
    pub database_url: Option<String>,
    /// Root of a running gateway. Purchases go straight to the local
    /// database when unset.
    pub gateway_url: Option<String>,
    pub listen_host: Option<String>,
    pub listen_port: Option<u16>,
    pub enable_logging: Option<bool>,
    /// Overrides the pricing config's dashboard refresh interval.
    pub poll_interval_secs: Option<u64>,
    /// JSON file with premium, coverage and multiplier tables.
    pub pricing_config: Option<PathBuf>,
}

impl CliConfig {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fasal-rakshak"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Loads from `path`, or the default location when `None`.
    /// A missing or unparsable file yields `CliConfig::default()`.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let Some(p) = Self::config_path() else {
                    debug!("Could not determine config directory");
                    return Self::default();
                };
                p
            }
        };

        if !path.exists() {
            debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<CliConfig>(&content) {
                Ok(config) => {
                    debug!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// `database-url`, falling back to `fasal.db` in the config directory,
    /// then in the working directory.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }
        let file = Self::config_dir()
            .map(|dir| dir.join("fasal.db"))
            .unwrap_or_else(|| PathBuf::from("fasal.db"));
        format!("sqlite:{}?mode=rwc", file.display())
    }

    pub fn listen_host(&self) -> &str {
        self.listen_host.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn listen_port(&self) -> u16 {
        self.listen_port.unwrap_or(DEFAULT_LISTEN_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CliConfig::default();
        assert!(config.gateway_url.is_none());
        assert_eq!(config.listen_port(), 5000);
        assert_eq!(config.listen_host(), "0.0.0.0");
        assert!(config.database_url().starts_with("sqlite:"));
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = CliConfig {
            gateway_url: Some("http://localhost:5000".to_string()),
            poll_interval_secs: Some(10),
            ..Default::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("gateway-url"));
        assert!(toml_str.contains("poll-interval-secs = 10"));
    }

    #[test]
    fn test_load_from_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database-url = \"sqlite::memory:\"\nlisten-port = 8080\n").unwrap();

        let config = CliConfig::load(Some(&path));
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.listen_port(), 8080);

        std::fs::write(&path, "listen-port = \"eighty\"").unwrap();
        assert_eq!(CliConfig::load(Some(&path)), CliConfig::default());
        assert_eq!(CliConfig::load(Some(&dir.path().join("absent.toml"))), CliConfig::default());
    }
}

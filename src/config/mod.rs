//! Prover configuration
//!
//! Loaded from a JSON file, then overridden by command-line flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::engine::{SearchConfig, DEFAULT_ALPHABET};

/// Default difficulty for issued challenges
pub const DEFAULT_BITS: u32 = 20;

/// Default address the verifier listens on
pub const DEFAULT_LISTEN: &str = "127.0.0.1:7000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings shared by the search and challenge commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// Worker threads (default: number of CPU cores)
    pub threads: Option<usize>,
    /// Leading 1-bits required by issued challenges
    pub bits: u32,
    /// Variable characters per search candidate
    pub variable_length: usize,
    /// Symbols tried at each variable position
    pub alphabet: String,
    /// Verifier listen address
    pub listen: String,
    /// How long the verifier waits for a response line
    pub read_timeout_secs: Option<u64>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            threads: None,
            bits: DEFAULT_BITS,
            variable_length: 12,
            alphabet: String::from_utf8_lossy(DEFAULT_ALPHABET).into_owned(),
            listen: DEFAULT_LISTEN.to_string(),
            read_timeout_secs: Some(60),
        }
    }
}

impl ProverConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    #[cfg(feature = "cli")]
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Engine settings for this configuration
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threads: self.threads,
            ..SearchConfig::default()
        }
    }

    /// Verifier read timeout; zero means none
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

/// Get the default config file path
#[cfg(feature = "cli")]
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".easypow").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProverConfig::default();
        assert_eq!(config.bits, 20);
        assert_eq!(config.variable_length, 12);
        assert_eq!(config.alphabet.len(), 62);
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.search_config().threads, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ProverConfig =
            serde_json::from_str(r#"{"bits": 12, "threads": 3}"#).unwrap();
        assert_eq!(config.bits, 12);
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.search_config().thread_count(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("easypow-config-{}", std::process::id()));
        let path = dir.join("config.json");

        let config = ProverConfig {
            bits: 24,
            listen: "0.0.0.0:9000".to_string(),
            read_timeout_secs: None,
            ..ProverConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ProverConfig::load(&path).unwrap(), config);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_zero_read_timeout_disables_timeout() {
        let config: ProverConfig = serde_json::from_str(r#"{"read_timeout_secs": 0}"#).unwrap();
        assert_eq!(config.read_timeout(), None);

        let config = ProverConfig {
            read_timeout_secs: Some(5),
            ..ProverConfig::default()
        };
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_file() {
        let result: Result<ProverConfig, _> = serde_json::from_str("{\"bits\": \"many\"}");
        assert!(result.is_err());
        assert!(matches!(
            ProverConfig::load(Path::new("/nonexistent/easypow.json")),
            Err(ConfigError::FileError(_))
        ));
    }
}

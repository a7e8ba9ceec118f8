//! Client configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed config file is never fatal: it is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "GRAPHREC_API_URL";

/// Environment variable overriding the session state file
pub const ENV_STATE_FILE: &str = "GRAPHREC_STATE_FILE";

/// Environment variable pointing at an alternate config file
pub const ENV_CONFIG: &str = "GRAPHREC_CONFIG";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_K: usize = 5;

/// Client configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the GraphRec API
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Session state file (optional, OS data dir if not specified)
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Number of recommendations requested when none is given
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_secs: default_timeout_secs(),
            state_file: None,
            default_k: default_k(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.default_k == 0 {
            return Err(Error::Config("default_k must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// State file to use, falling back to the OS data directory
    pub fn state_file_or_default(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_file)
    }
}

/// Resolves [`ClientConfig`] from CLI arguments, environment and TOML
#[derive(Debug, Default, Clone)]
pub struct ConfigResolver {
    config_path: Option<PathBuf>,
    api_url: Option<String>,
    state_file: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config file given on the command line
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// API base URL given on the command line
    pub fn api_url(mut self, url: Option<String>) -> Self {
        self.api_url = url;
        self
    }

    /// State file given on the command line
    pub fn state_file(mut self, path: Option<PathBuf>) -> Self {
        self.state_file = path;
        self
    }

    /// Produce the effective configuration
    pub fn resolve(&self) -> ClientConfig {
        let mut config = self.load_toml().unwrap_or_default();

        // Priority 2: Environment variables
        if let Some(url) = non_empty_env(ENV_API_URL) {
            debug!("Using API URL from {}", ENV_API_URL);
            config.base_url = url;
        }
        if let Some(path) = non_empty_env(ENV_STATE_FILE) {
            config.state_file = Some(PathBuf::from(path));
        }

        // Priority 1: Command-line arguments
        if let Some(url) = &self.api_url {
            config.base_url = url.clone();
        }
        if let Some(path) = &self.state_file {
            config.state_file = Some(path.clone());
        }

        config
    }

    fn load_toml(&self) -> Option<ClientConfig> {
        let explicit = self
            .config_path
            .clone()
            .or_else(|| non_empty_env(ENV_CONFIG).map(PathBuf::from));

        let path = match explicit {
            Some(path) => path,
            None => {
                let path = default_config_path()?;
                if !path.exists() {
                    debug!(path = %path.display(), "No config file, using defaults");
                    return None;
                }
                path
            }
        };

        match ClientConfig::load_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config file");
                Some(config)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Config file unusable, continuing with defaults"
                );
                None
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Platform config file location (`<config_dir>/graphrec/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("graphrec").join("config.toml"))
}

/// Platform session file location (`<data_local_dir>/graphrec/session.toml`)
pub fn default_state_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("graphrec"))
        .unwrap_or_else(|| PathBuf::from("./graphrec_data"))
        .join("session.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.default_k, 5);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str("base_url = \"http://api:9000\"").unwrap();
        assert_eq!(config.base_url, "http://api:9000");
        assert_eq!(config.default_k, DEFAULT_K);
        assert!(config.state_file.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_k() {
        let config = ClientConfig {
            default_k: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_state_file_falls_back_to_data_dir() {
        let config = ClientConfig::default();
        assert!(config.state_file_or_default().ends_with("session.toml"));

        let custom = ClientConfig {
            state_file: Some(PathBuf::from("/tmp/s.toml")),
            ..ClientConfig::default()
        };
        assert_eq!(custom.state_file_or_default(), PathBuf::from("/tmp/s.toml"));
    }
}

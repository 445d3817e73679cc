//! Persistent configuration for uiaroute.
//!
//! Stores settings in `~/.uiaroute/config.json`. Every field has a default, so
//! an empty or missing file yields a working configuration that talks to the
//! device server on localhost.
//!
//! # Example
//!
//! ```no_run
//! use uiaroute_core::config::UiaConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = UiaConfig::load();
//! println!("server: {}", config.server_url);
//! println!("wait margin: {:?}", config.client_timeout_margin());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIRNAME: &str = ".uiaroute";
const CONFIG_FILENAME: &str = "config.json";

/// Errors reading or writing an explicit config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid config JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

fn default_server_url() -> String {
    "http://127.0.0.1:37265".to_string()
}

fn default_uia_route() -> String {
    crate::router::DEFAULT_UIA_ROUTE.to_string()
}

fn default_http_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_client_timeout_margin_ms() -> u64 {
    5_000
}

/// uiaroute configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiaConfig {
    /// Base URL of the automation server embedded in the app.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Route UIA commands are posted to.
    #[serde(default = "default_uia_route")]
    pub uia_route: String,

    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Delay between condition checks in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Extra time added to every wait timeout to absorb transport latency.
    #[serde(default = "default_client_timeout_margin_ms")]
    pub client_timeout_margin_ms: u64,

    /// Host automation tool used by the `host` strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_program: Option<PathBuf>,

    /// Arguments placed before the serialized command when running the host tool.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_args: Vec<String>,
}

impl Default for UiaConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            uia_route: default_uia_route(),
            http_timeout_ms: default_http_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            client_timeout_margin_ms: default_client_timeout_margin_ms(),
            host_program: None,
            host_args: Vec::new(),
        }
    }
}

/// Returns `~/.uiaroute/config.json`, if the home directory is known.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIRNAME).join(CONFIG_FILENAME))
}

impl UiaConfig {
    /// Load config from `~/.uiaroute/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        config_path()
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save config to `~/.uiaroute/config.json`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path().ok_or(ConfigError::NoHomeDir)?;
        self.save_to(&path)
    }

    /// Save config to an explicit file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Delay between condition checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Margin added to wait timeouts.
    pub fn client_timeout_margin(&self) -> Duration {
        Duration::from_millis(self.client_timeout_margin_ms)
    }
}

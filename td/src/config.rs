//! taskd configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::executor::ExecutorConfig;

/// Address the server binds when nothing else is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the server binds when nothing else is configured
pub const DEFAULT_PORT: u16 = 5000;

/// Main taskd configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerConfig,

    /// Worker pool and task timing
    pub executor: ExecutorConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise try `./taskd.yml`, then
    /// `<config_dir>/taskd/taskd.yml`, then fall back to defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from("taskd.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskd").join("taskd.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Command-line flags win over whatever the file said
    pub fn apply_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port; 0 picks an ephemeral one
    pub port: u16,

    /// Longest request line accepted, in bytes
    #[serde(rename = "max-line-bytes")]
    pub max_line_bytes: usize,
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_line_bytes: 64 * 1024,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs here instead of stderr
    pub file: Option<PathBuf>,
}

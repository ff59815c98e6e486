//! Configuration management for PetChain

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use crate::constants::DEFAULT_DIFFICULTY;
use crate::consensus::MAX_DIFFICULTY;
use crate::logging::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Proof-of-work settings, fixed for the life of the process
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Highest nonce tried before mining gives up
    #[serde(default = "default_max_nonce")]
    pub max_nonce: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_nonce: default_max_nonce(),
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub path: String,
    /// When false the chain lives in memory only
    #[serde(default = "default_persistent")]
    pub persistent: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_data_dir(),
            persistent: default_persistent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl RpcConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl LoggingConfig {
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.format.parse().map_err(ConfigError::Invalid)
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_max_nonce() -> u64 {
    u64::MAX
}

fn default_data_dir() -> String {
    "./data/petchain".to_string()
}

fn default_persistent() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "human".to_string()
}

impl NodeConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate critical values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.difficulty == 0 || self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::Invalid(format!(
                "ledger.difficulty must be in 1..={}, got {}",
                MAX_DIFFICULTY, self.ledger.difficulty
            )));
        }
        if self.storage.persistent && self.storage.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.path must be set when storage.persistent is true".to_string(),
            ));
        }
        self.logging.log_format()?;
        Ok(())
    }
}

/// Load configuration from `path`; a missing file yields the defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NodeConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        let config = NodeConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let source = fs::read_to_string(path)?;
    NodeConfig::from_toml(&source)
}

//! # Configuration
//!
//! TOML configuration for the `grounds` tool. Two sections:
//!
//! - [`WorldConfig`] - where the world lives on disk and which universe
//!   commands act on by default
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```rust,no_run
//! use grounds::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("world store: {}", config.world.store_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ```toml
//! [world]
//! data_dir = "./data"
//! world_file = "world.json"
//! default_namespace = "grounds"
//! safe_save = true
//!
//! [logging]
//! level = "info"
//! file = "grounds.log"
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::validation::validate_namespace_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub data_dir: String,
    /// JSON export of the whole multiverse, relative to `data_dir`.
    #[serde(default = "default_world_file")]
    pub world_file: String,
    /// sled directory; `<data_dir>/world.db` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Write save files through a temp file and rename.
    #[serde(default = "default_safe_save")]
    pub safe_save: bool,
}

fn default_world_file() -> String {
    "world.json".to_string()
}

fn default_namespace() -> String {
    "grounds".to_string()
}

fn default_safe_save() -> bool {
    true
}

impl WorldConfig {
    pub fn world_file_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.world_file)
    }

    pub fn store_path(&self) -> PathBuf {
        match &self.store_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("world.db"),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            world_file: default_world_file(),
            store_path: None,
            default_namespace: default_namespace(),
            safe_save: default_safe_save(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file and validate it.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.world.data_dir.trim().is_empty() {
            return Err(anyhow!("world.data_dir must not be empty"));
        }
        if self.world.world_file.trim().is_empty() {
            return Err(anyhow!("world.world_file must not be empty"));
        }
        validate_namespace_name(&self.world.default_namespace)
            .map_err(|e| anyhow!("world.default_namespace: {}", e))?;
        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            return Err(anyhow!("logging.level {:?} is not a log level", self.logging.level));
        }
        Ok(())
    }
}

//! Agent configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use command_bridge::AgentSettings;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

const APP_DIR: &str = "uiauto-agent";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub logging: LoggingConfig,
    pub agent: AgentSettings,
    /// Screen fixture served when `--screen` is not given.
    pub screen: Option<PathBuf>,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.logging
            .level
            .parse::<tracing::Level>()
            .with_context(|| format!("invalid log level '{}'", self.logging.level))?;
        Ok(())
    }
}

pub struct LoadedConfig {
    pub config: AgentConfig,
    pub path: PathBuf,
}

/// `<config dir>/uiauto-agent/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push(APP_DIR);
    path.push(CONFIG_FILE);
    Ok(path)
}

/// Reads `path` (or the default location); a missing file yields defaults.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    if fs::try_exists(&path).await.unwrap_or(false) {
        let config = parse_config_file(&path).await?;
        info!("Loaded configuration from: {}", path.display());
        Ok(LoadedConfig { config, path })
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
        Ok(LoadedConfig {
            config: AgentConfig::default(),
            path,
        })
    }
}

pub async fn parse_config_file(path: &Path) -> Result<AgentConfig> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use device_adapter::VirtualScreen;

use crate::config::AgentConfig;
use crate::session::load_screen;

pub struct CliContext {
    config: AgentConfig,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: AgentConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The `--screen` argument, else the configured fixture.
    pub async fn screen(&self, explicit: Option<&Path>) -> Result<VirtualScreen> {
        let path = explicit
            .or(self.config.screen.as_deref())
            .context("no screen fixture: pass --screen or set 'screen' in the configuration")?;
        load_screen(path).await
    }
}

//! Config store for loading and saving tether.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{TetherConfig, parser};

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "tether.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config dir>/tether/tether.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("tether");
        Ok(Self::from_path(global_dir.join(CONFIG_FILE_NAME)))
    }

    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(&self) -> anyhow::Result<TetherConfig> {
        if !self.config_path.exists() {
            return Ok(TetherConfig::new());
        }
        parser::parse_tether_toml(&self.config_path)
    }

    pub fn save(&self, config: &TetherConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}

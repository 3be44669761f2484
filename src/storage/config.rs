//! JSON Configuration Management
//!
//! Loads and persists the bootstrap configuration at
//! `~/.taskpilot/config.json`. Out-of-range runtime fields are clamped on
//! load; structurally invalid configs are rejected with a validation
//! error instead of being silently corrected.

use std::fs;
use std::path::PathBuf;

use crate::models::{AppConfig, RuntimeConfig, RuntimeConfigUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_taskpilot_dir};

/// Configuration service for the daemon's bootstrap settings.
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the config from the default location, creating it with
    /// defaults on first run.
    pub fn new() -> AppResult<Self> {
        ensure_taskpilot_dir()?;
        Self::at_path(config_path()?)
    }

    /// Load or create the config at an explicit path.
    pub fn at_path(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_from_file(path: &PathBuf) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.normalize();
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    fn save_to_file(path: &PathBuf, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Apply a partial runtime update and persist the result.
    pub fn update_runtime(&mut self, update: RuntimeConfigUpdate) -> AppResult<RuntimeConfig> {
        self.config.runtime.apply_update(update);
        self.save()?;
        Ok(self.config.runtime)
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload the configuration from disk.
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }
}

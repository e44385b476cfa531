// File: engine/src/config/manager.rs
use super::Config;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::errors::{ConfigError, EngineError};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "AGENT_CONFIG";

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/main.toml";

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load_configuration(config_path.as_ref()).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    /// Loads from `AGENT_CONFIG`, falling back to `config/main.toml`
    pub async fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::new(path).await
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_path: &Path) -> Result<Config> {
        let mut config = if fs::try_exists(config_path).await.unwrap_or(false) {
            debug!("Loading config: {}", config_path.display());

            let content = fs::read_to_string(config_path).await.map_err(|e| {
                EngineError::from(ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    reason: e.to_string(),
                })
            })?;

            toml::from_str::<Config>(&content).map_err(|e| {
                EngineError::from(ConfigError::ParseError {
                    reason: format!("{}: {}", config_path.display(), e),
                })
            })?
        } else {
            info!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Config::default()
        };

        config.tls = config.tls.with_env_overrides();

        info!(
            "Configuration loaded: listen {}, work dir {}, client cert {}",
            config.listen_addr(),
            config.work_dir.display(),
            if config.tls.client_cert.is_some() { "set" } else { "unset" }
        );

        Ok(config)
    }
}

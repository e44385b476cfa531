// File: engine/src/config/mod.rs
pub mod manager;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::env;
use crate::errors::{ConfigError, EngineError};

pub use manager::ConfigManager;

/// Agent settings, read from `main.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory backups are written to and restored from
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default)]
    pub tls: TlsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            work_dir: default_work_dir(),
            tls: TlsConfig::default(),
        }
    }
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client certificate pair presented to `https` endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl TlsConfig {
    pub fn new(client_cert: impl Into<PathBuf>, client_key: impl Into<PathBuf>) -> Self {
        Self {
            client_cert: Some(client_cert.into()),
            client_key: Some(client_key.into()),
        }
    }

    /// Reads `RS_ETCD_CLIENT_CERT` and `RS_ETCD_CLIENT_KEY`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Environment variables win over values from a config file
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(cert) = std::env::var_os(env::CLIENT_CERT) {
            self.client_cert = Some(PathBuf::from(cert));
        }
        if let Some(key) = std::env::var_os(env::CLIENT_KEY) {
            self.client_key = Some(PathBuf::from(key));
        }
        self
    }

    /// Both paths, or an error naming the one that is missing
    pub fn paths(&self) -> Result<(&Path, &Path)> {
        let cert = self.client_cert.as_deref().ok_or_else(|| {
            EngineError::from(ConfigError::MissingRequired {
                field: env::CLIENT_CERT.to_string(),
            })
        })?;
        let key = self.client_key.as_deref().ok_or_else(|| {
            EngineError::from(ConfigError::MissingRequired {
                field: env::CLIENT_KEY.to_string(),
            })
        })?;
        Ok((cert, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_full_config() {
        let main_toml = r#"
host = "127.0.0.1"
port = 9090
work_dir = "/var/backups/etcd"

[tls]
client_cert = "/etc/etcd/client.crt"
client_key = "/etc/etcd/client.key"
        "#;

        let config: Config = toml::from_str(main_toml).unwrap();

        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
        assert_eq!(config.work_dir, PathBuf::from("/var/backups/etcd"));
        assert_eq!(
            config.tls,
            TlsConfig::new("/etc/etcd/client.crt", "/etc/etcd/client.key")
        );
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.work_dir, PathBuf::from("/tmp"));
        assert!(config.tls.client_cert.is_none());
    }

    #[test]
    fn test_missing_key_is_reported() {
        let tls = TlsConfig {
            client_cert: Some(PathBuf::from("/etc/etcd/client.crt")),
            client_key: None,
        };

        let err = tls.paths().unwrap_err();
        assert!(err.to_string().contains(env::CLIENT_KEY));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        std::env::set_var(env::CLIENT_CERT, "/from/env.crt");
        std::env::remove_var(env::CLIENT_KEY);

        let tls = TlsConfig::new("/from/file.crt", "/from/file.key").with_env_overrides();

        std::env::remove_var(env::CLIENT_CERT);

        assert_eq!(tls.client_cert, Some(PathBuf::from("/from/env.crt")));
        assert_eq!(tls.client_key, Some(PathBuf::from("/from/file.key")));
    }
}

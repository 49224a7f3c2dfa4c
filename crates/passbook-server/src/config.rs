//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} is required for the {backend} backend")]
    Missing {
        name: &'static str,
        backend: &'static str,
    },
}

/// Which record store backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
    Remote,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: BackendKind,
    /// Database file for the `file` backend.
    pub data_path: PathBuf,
    /// Document host base URL for the `remote` backend.
    pub remote_url: Option<String>,
    pub remote_token: Option<String>,
    pub remote_timeout: Duration,
    /// Optional credential pepper.
    pub pepper: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            Err(_) => 3000,
        };

        let backend = match std::env::var("PASSBOOK_BACKEND").as_deref() {
            Ok("memory") | Err(_) => BackendKind::Memory,
            Ok("file") => BackendKind::File,
            Ok("remote") => BackendKind::Remote,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "PASSBOOK_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let data_path = std::env::var("PASSBOOK_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("passbook.json"));

        let remote_url = std::env::var("PASSBOOK_REMOTE_URL").ok();
        if backend == BackendKind::Remote && remote_url.is_none() {
            return Err(ConfigError::Missing {
                name: "PASSBOOK_REMOTE_URL",
                backend: "remote",
            });
        }

        Ok(Self {
            port,
            backend,
            data_path,
            remote_url,
            remote_token: std::env::var("PASSBOOK_REMOTE_TOKEN").ok(),
            remote_timeout: Duration::from_secs(10),
            pepper: std::env::var("PASSBOOK_PEPPER").ok(),
        })
    }
}

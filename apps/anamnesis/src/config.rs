//! # Application Configuration
//!
//! Layered configuration: CLI flags > environment > optional
//! `anamnesis.toml` > built-in defaults.
//!
//! ## Environment Variables
//!
//! - `ANAMNESIS_PASSPHRASE`: passphrase for the sealed vault and backups
//! - `ANAMNESIS_ADMIN_KEY`: static shared secret for the admin surface
//! - `ANAMNESIS_CORS_ORIGINS`: comma-separated allow-list, or `*`
//! - `ANAMNESIS_RATE_LIMIT`: requests per second (0 disables)
//! - `ANAMNESIS_LOG_FORMAT`: `text` (default) or `json`

use anamnesis_core::InterviewError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
const DEFAULT_DATA_DIR: &str = "anamnesis-data";

/// Default bind address for the HTTP server.
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Passphrase used when the operator configures none.
///
/// Matching the deployment reality of the system this replaces: the vault
/// then only deters casual file browsing. A startup warning says so.
const FALLBACK_PASSPHRASE: &str = "anamnesis-local";

/// Shape of the optional `anamnesis.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Resolve configuration from CLI flags and an optional config file.
    pub fn resolve(
        cli_data_dir: Option<PathBuf>,
        config_path: Option<&Path>,
    ) -> Result<Self, InterviewError> {
        let file = match config_path {
            Some(path) => load_file(path)?,
            None => {
                let default_path = Path::new("anamnesis.toml");
                if default_path.exists() {
                    load_file(default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Self {
            data_dir: cli_data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            host: file.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: file.port.unwrap_or(DEFAULT_PORT),
        })
    }

    /// The vault database path inside the data directory.
    #[must_use]
    pub fn vault_path(&self) -> PathBuf {
        self.data_dir.join("vault.redb")
    }
}

fn load_file(path: &Path) -> Result<FileConfig, InterviewError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| InterviewError::Io(format!("read config {path:?}: {e}")))?;
    toml::from_str(&text)
        .map_err(|e| InterviewError::Serialization(format!("parse config {path:?}: {e}")))
}

/// The vault passphrase, from `ANAMNESIS_PASSPHRASE` or the fallback.
#[must_use]
pub fn passphrase_from_env() -> String {
    match std::env::var("ANAMNESIS_PASSPHRASE") {
        Ok(p) if !p.is_empty() => p,
        _ => {
            tracing::warn!(
                "ANAMNESIS_PASSPHRASE not set - using the built-in passphrase. \
                 Local data is only protected against casual inspection."
            );
            FALLBACK_PASSPHRASE.to_string()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

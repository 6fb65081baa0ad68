//! Client configuration loading.
//!
//! Configuration comes from an optional JSON file, then environment
//! variables override individual fields:
//! - `TOKENWARDEN_API_URL` replaces `api_url`
//! - `TOKENWARDEN_SESSION_FILE` replaces `session_file`
//! - `TOKENWARDEN_LOG` replaces `log_level`

use std::path::{Path, PathBuf};

use tokenwarden_domain::ClientConfig;
use tokio::fs;
use tracing::debug;

use crate::persistence::default_session_path;
use crate::serialization::{SerializationError, from_json_bytes};

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "TOKENWARDEN_API_URL";
/// Environment variable overriding the session file location.
pub const ENV_SESSION_FILE: &str = "TOKENWARDEN_SESSION_FILE";
/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "TOKENWARDEN_LOG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ClientConfig`].
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] SerializationError),

    /// The resulting configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returns the default configuration file location, if available.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tokenwarden").join("config.json"))
}

/// Loads the configuration from `path` (or the default location) and the
/// process environment.
///
/// A missing file at the default location is not an error; a missing file
/// that was asked for explicitly is.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the final
/// configuration is invalid.
pub async fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path).await?,
        None => match default_config_path() {
            Some(path) if fs::try_exists(&path).await.unwrap_or(false) => {
                read_config_file(&path).await?
            }
            _ => ClientConfig::default(),
        },
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
        .validate()
        .map_err(|e| ConfigError::Invalid(e.detail()))?;
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded configuration file");
    Ok(from_json_bytes(&content)?)
}

/// Applies environment overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = read(ENV_API_URL) {
        config.api_url = url;
    }
    if let Some(file) = read(ENV_SESSION_FILE) {
        config.session_file = Some(PathBuf::from(file));
    }
    if let Some(level) = read(ENV_LOG) {
        config.log_level = level;
    }
}

/// Session file for `config`: the configured path or the platform default.
#[must_use]
pub fn session_path(config: &ClientConfig) -> Option<PathBuf> {
    config.session_file.clone().or_else(default_session_path)
}

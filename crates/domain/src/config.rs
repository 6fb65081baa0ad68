//! Client Configuration Domain Model
//!
//! Defines where the backend lives and how the client talks to it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost/api/v1";

/// Configuration for the authentication client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL including the API prefix (e.g. `https://host/api/v1`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout applied by the HTTP adapter. `None` disables it.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Where the session is persisted. `None` uses the platform default.
    #[serde(default)]
    pub session_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    format!("tokenwarden/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            user_agent: default_user_agent(),
            session_file: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at `api_url`.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Joins an API path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when the base URL is empty or not HTTP(S).
    pub fn validate(&self) -> AuthResult<()> {
        let url = self.base_url();
        if url.is_empty() {
            return Err(AuthError::Configuration {
                message: "api_url is required".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AuthError::Configuration {
                message: format!("api_url must be an http(s) URL, got {url}"),
            });
        }
        Ok(())
    }
}

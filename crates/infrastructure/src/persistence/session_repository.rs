//! Session persistence.
//!
//! Stores the session in the platform-specific config directory unless a
//! path is configured:
//! - Linux: ~/.config/tokenwarden/session.json
//! - macOS: ~/Library/Application Support/tokenwarden/session.json
//! - Windows: %APPDATA%/tokenwarden/session.json

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokenwarden_application::ports::{SessionRepository, SessionStoreError};
use tokenwarden_domain::SessionState;
use tokio::fs;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name used under the config directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Returns the default session file location, if the platform has a config directory.
#[must_use]
pub fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tokenwarden").join(SESSION_FILE_NAME))
}

/// JSON file repository for the session.
#[derive(Debug, Clone, Default)]
pub struct FileSessionRepository {
    path: Option<PathBuf>,
}

impl FileSessionRepository {
    /// Creates a repository writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Creates a repository at the platform default location.
    #[must_use]
    pub fn at_default_location() -> Self {
        Self {
            path: default_session_path(),
        }
    }

    /// Returns the path where the session is stored, if available.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn load(&self) -> Result<Option<SessionState>, SessionStoreError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        if !fs::try_exists(path).await? {
            return Ok(None);
        }

        let content = fs::read(path).await?;
        let state = from_json_bytes(&content)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        debug!(path = %path.display(), "Loaded session");
        Ok(Some(state))
    }

    async fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        let Some(path) = &self.path else {
            return Err(SessionStoreError::NoLocation);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(state)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        fs::write(path, content).await?;
        debug!(path = %path.display(), "Saved session");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

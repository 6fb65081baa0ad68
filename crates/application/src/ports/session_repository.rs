//! Session repository port
//!
//! Defines the interface for persisting the session between runs.

use async_trait::async_trait;
use tokenwarden_domain::SessionState;

/// Errors that can occur during session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No location to persist to.
    #[error("No session location available")]
    NoLocation,
}

/// Repository trait for session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads the persisted session.
    ///
    /// # Returns
    /// `None` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<SessionState>, SessionStoreError>;

    /// Persists the session, replacing what was stored.
    ///
    /// # Errors
    /// Returns an error if the session cannot be written.
    async fn save(&self, state: &SessionState) -> Result<(), SessionStoreError>;

    /// Removes the persisted session. Missing data is not an error.
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

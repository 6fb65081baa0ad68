//! User-facing notices
//!
//! Every failed session operation produces exactly one notice. Routine
//! token renewal produces none.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Neutral information.
    #[default]
    Info,
    /// An operation succeeded.
    Success,
    /// An operation failed.
    Error,
}

/// A title/content pair shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Severity.
    #[serde(default)]
    pub level: NoticeLevel,
}

impl Notice {
    /// Informational notice.
    #[must_use]
    pub fn info(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level: NoticeLevel::Info,
        }
    }

    /// Success notice.
    #[must_use]
    pub fn success(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level: NoticeLevel::Success,
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level: NoticeLevel::Error,
        }
    }

    /// The notice shown when the session cannot be renewed.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::error("Session expired", "Your session has expired. Please log in again.")
    }

    /// Generic notice for an error that has no operation-specific copy.
    #[must_use]
    pub fn from_error(error: &AuthError) -> Self {
        let message = error.detail();
        match error {
            AuthError::NetworkFailure { .. } => Self::error(
                "Network error",
                "Could not reach the server. Check your connection and try again.",
            ),
            AuthError::Decode { .. } => {
                Self::error("Error", "The server sent an unexpected response.")
            }
            AuthError::NotAuthenticated => {
                Self::error("Unauthorized", "You need to log in to continue.")
            }
            _ => match error.status() {
                Some(400 | 422) => Self::error("Invalid Request", message),
                Some(401) => {
                    if message.contains("expired") || message.contains("token") {
                        Self::error(
                            "Unauthorized",
                            "Your session has expired. Please log in again.",
                        )
                    } else {
                        Self::error("Unauthorized", "You need to log in to continue.")
                    }
                }
                Some(403) => {
                    Self::error("Forbidden", "You do not have permission to do this.")
                }
                Some(404) => Self::error("Not Found", "The requested resource was not found."),
                Some(429) => Self::error(
                    "Too Many Requests",
                    "Too many requests. Please wait a few minutes and try again.",
                ),
                Some(500..=599) => {
                    Self::error("Server Error", "Server error. Please try again later.")
                }
                _ => Self::error("Error", message),
            },
        }
    }
}

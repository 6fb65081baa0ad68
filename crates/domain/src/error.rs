//! Domain error types

use thiserror::Error;

/// Errors produced while talking to the authentication backend.
///
/// The type is `Clone` so that a single refresh outcome can be handed to
/// every caller that was waiting on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request never produced a response (connect, DNS, TLS, timeout).
    #[error("network failure: {message}")]
    NetworkFailure {
        /// Transport error description.
        message: String,
    },

    /// A 401 could not be recovered because no fresh access token was obtained.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Human readable reason.
        message: String,
    },

    /// The backend rejected the submitted fields.
    #[error("validation failed ({status}): {message}")]
    ValidationFailed {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("request failed ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The refresh cycle this caller was waiting on failed.
    #[error("token refresh failed: {message}")]
    RefreshFailed {
        /// Why the cycle failed.
        message: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("malformed response: {message}")]
    Decode {
        /// Parser error description.
        message: String,
    },

    /// The operation requires an authenticated session.
    #[error("no authenticated session")]
    NotAuthenticated,

    /// Locally held state does not line up with what the caller presented.
    #[error("inconsistent session state: {message}")]
    StateInconsistency {
        /// What did not match.
        message: String,
    },

    /// The client was configured with invalid values.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },
}

impl AuthError {
    /// Builds the error for a non-2xx response.
    ///
    /// 400 and 422 are structured field rejections; everything else keeps its
    /// status code under [`AuthError::Api`].
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => Self::ValidationFailed { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// Shorthand for a network failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    /// Shorthand for a decode failure.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ValidationFailed { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::AuthenticationFailed { .. } => Some(401),
            _ => None,
        }
    }

    /// The underlying message without the variant prefix.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NetworkFailure { message }
            | Self::AuthenticationFailed { message }
            | Self::ValidationFailed { message, .. }
            | Self::Api { message, .. }
            | Self::RefreshFailed { message }
            | Self::Decode { message }
            | Self::StateInconsistency { message }
            | Self::Configuration { message } => message.clone(),
            Self::NotAuthenticated => self.to_string(),
        }
    }

    /// Returns true when the session can no longer be used.
    #[must_use]
    pub const fn is_session_terminal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::RefreshFailed { .. }
        )
    }
}

/// Result type alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

//! Response specification type

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AuthError, AuthResult};
use crate::request::Headers;

/// HTTP response as seen by the client core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,
    /// Response headers
    pub headers: Headers,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response with a status and body.
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decode`] when the body is not the expected JSON.
    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| AuthError::decode(e.to_string()))
    }

    /// Best-effort error message for a failed response.
    ///
    /// Looks at `detail` (a string, or a list of `{ "msg": ... }` entries)
    /// and then `message`; falls back to the status line.
    #[must_use]
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<Value>(&self.body)
            .ok()
            .and_then(|body| extract_message(&body))
            .unwrap_or_else(|| {
                format!("Request failed with {}: {}", self.status, self.status_text)
            })
    }

    /// Parses a 2xx body, or turns a non-2xx response into a structured error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ValidationFailed`] or [`AuthError::Api`] for
    /// non-2xx statuses, [`AuthError::Decode`] for a malformed 2xx body.
    pub fn into_json<T: DeserializeOwned>(self) -> AuthResult<T> {
        if self.is_success() {
            self.json()
        } else {
            Err(AuthError::from_status(self.status, self.error_message()))
        }
    }
}

fn extract_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

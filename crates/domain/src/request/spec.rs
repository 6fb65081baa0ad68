//! Backend request specification

use serde::Serialize;
use serde_json::Value;

use super::header::{AUTHORIZATION, Headers};
use super::method::HttpMethod;
use crate::error::{AuthError, AuthResult};

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// JSON document.
    Json(Value),
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
}

/// A request against the backend API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the API base, starting with `/`.
    pub path: String,
    /// Caller supplied headers.
    pub headers: Headers,
    /// Payload.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: RequestBody::None,
        }
    }

    /// GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Adds a header, keeping existing ones.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets `Authorization: Bearer <token>`, replacing any existing credential.
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.headers.set(AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    /// Serializes `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decode`] if the payload cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> AuthResult<Self> {
        let value = serde_json::to_value(payload).map_err(|e| AuthError::decode(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Sets form fields as the body.
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Bearer token currently attached, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

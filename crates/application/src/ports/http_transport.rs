//! HTTP transport port

use async_trait::async_trait;
use tokenwarden_domain::{ApiRequest, ApiResponse, AuthResult};

/// Port for sending a single request to the backend.
///
/// Implementations perform exactly one physical request per call and never
/// retry or refresh on their own; that is the job of
/// [`AuthenticatedRequester`](crate::AuthenticatedRequester).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns whatever status the backend answered with.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NetworkFailure`](tokenwarden_domain::AuthError::NetworkFailure)
    /// when no response was received. Non-2xx statuses are not errors here.
    async fn send(&self, request: &ApiRequest) -> AuthResult<ApiResponse>;
}

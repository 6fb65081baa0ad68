//! Requests carrying the session's access token.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokenwarden_domain::request::{APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE};
use tokenwarden_domain::{ApiRequest, ApiResponse, AuthError, AuthResult};
use tracing::{debug, warn};

use super::{RefreshCoordinator, SessionContext};
use crate::ports::HttpTransport;

const SESSION_EXPIRED: &str = "session expired, log in again";

/// Sends requests with the current access token and recovers from one 401.
///
/// A logical call makes at most two physical requests: the original and,
/// after a successful refresh, one retry carrying the new token.
pub struct AuthenticatedRequester {
    context: Arc<SessionContext>,
    transport: Arc<dyn HttpTransport>,
    refresher: Arc<RefreshCoordinator>,
}

impl AuthenticatedRequester {
    /// Creates a requester sharing `context` with the coordinator.
    #[must_use]
    pub fn new(
        context: Arc<SessionContext>,
        transport: Arc<dyn HttpTransport>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            context,
            transport,
            refresher,
        }
    }

    /// Sends `request` and returns the response as-is, whatever its status.
    ///
    /// # Errors
    ///
    /// [`AuthError::AuthenticationFailed`] when the backend answered 401 and
    /// no new token could be obtained; transport errors otherwise.
    pub async fn request(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        let token = self.context.tokens().access_token().await;
        let response = self
            .transport
            .send(&with_credentials(&request, token.as_deref()))
            .await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!(path = %request.path, "Got 401, attempting token refresh");
        match self.refresher.refresh().await {
            Ok(Some(token)) => {
                self.transport
                    .send(&with_credentials(&request, Some(&token)))
                    .await
            }
            Ok(None) => {
                debug!(path = %request.path, "No token after refresh");
                Err(session_expired())
            }
            Err(error) => {
                warn!(%error, path = %request.path, "Refresh failed while retrying request");
                Err(session_expired())
            }
        }
    }

    /// Sends `request` and parses a 2xx JSON body.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus
    /// [`AuthError::ValidationFailed`] or [`AuthError::Api`] for non-2xx
    /// statuses and [`AuthError::Decode`] for an unexpected body.
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> AuthResult<T> {
        self.request(request).await?.into_json()
    }
}

impl std::fmt::Debug for AuthenticatedRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedRequester")
            .finish_non_exhaustive()
    }
}

/// Every caller that loses its token in the same refresh cycle gets this
/// exact error, whether it started the cycle or waited on it.
fn session_expired() -> AuthError {
    AuthError::AuthenticationFailed {
        message: SESSION_EXPIRED.to_string(),
    }
}

/// Caller headers plus the bearer token; an existing `Authorization` is replaced.
fn with_credentials(request: &ApiRequest, token: Option<&str>) -> ApiRequest {
    let mut prepared = request.clone();
    prepared.headers.set_if_absent(CONTENT_TYPE, APPLICATION_JSON);
    match token {
        Some(token) => prepared.bearer(token),
        None => {
            prepared.headers.remove(AUTHORIZATION);
            prepared
        }
    }
}

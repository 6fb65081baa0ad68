//! Typed calls for every backend endpoint.
//!
//! Calls that act on the signed-in user go through the
//! [`AuthenticatedRequester`]. Calls that carry a one-time credential
//! (a claim, the refresh token, a recovery token) or none at all go straight
//! to the transport with that credential as bearer.

pub mod endpoints;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tokenwarden_domain::request::{APPLICATION_JSON, CONTENT_TYPE, FORM_URLENCODED};
use tokenwarden_domain::{
    ApiRequest, AuthResult, EnableTotp, Msg, NewTotp, RecoveryAck, TokenPair, UserProfile,
    UserProfileCreate, UserProfileUpdate, WebToken,
};

use crate::auth::AuthenticatedRequester;
use crate::ports::HttpTransport;

/// Endpoint catalogue of the backend.
pub struct BackendApi {
    requester: Arc<AuthenticatedRequester>,
    transport: Arc<dyn HttpTransport>,
}

impl BackendApi {
    /// Creates the catalogue.
    #[must_use]
    pub fn new(requester: Arc<AuthenticatedRequester>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            requester,
            transport,
        }
    }

    /// The requester used for authenticated calls.
    #[must_use]
    pub const fn requester(&self) -> &Arc<AuthenticatedRequester> {
        &self.requester
    }

    async fn send_json<T: DeserializeOwned>(&self, mut request: ApiRequest) -> AuthResult<T> {
        request.headers.set_if_absent(CONTENT_TYPE, APPLICATION_JSON);
        self.transport.send(&request).await?.into_json()
    }

    // Login

    /// Password grant.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn login_with_password(&self, username: &str, password: &str) -> AuthResult<TokenPair> {
        let request = ApiRequest::post(endpoints::LOGIN_OAUTH)
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .form([
                ("username", username),
                ("password", password),
                ("grant_type", "password"),
            ]);
        self.send_json(request).await
    }

    /// Asks for a magic link to be emailed; returns the local half of the claim.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn request_magic_link(&self, email: &str) -> AuthResult<WebToken> {
        self.send_json(ApiRequest::post(endpoints::with_email(
            endpoints::LOGIN_MAGIC,
            email,
        )))
        .await
    }

    /// Redeems a magic link.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn claim_magic_link(&self, redeemed: &str, local_claim: &str) -> AuthResult<TokenPair> {
        let request = ApiRequest::post(endpoints::LOGIN_CLAIM)
            .bearer(redeemed)
            .json(&WebToken::new(local_claim))?;
        self.send_json(request).await
    }

    /// Completes a login that is waiting for a TOTP code.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn login_with_totp(&self, totp_claim: &str, code: &str) -> AuthResult<TokenPair> {
        let request = ApiRequest::post(endpoints::LOGIN_TOTP)
            .bearer(totp_claim)
            .json(&WebToken::new(code))?;
        self.send_json(request).await
    }

    /// Revokes a refresh token.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn revoke(&self, refresh_token: &str) -> AuthResult<Msg> {
        self.send_json(ApiRequest::post(endpoints::LOGIN_REVOKE).bearer(refresh_token))
            .await
    }

    // Two-factor

    /// Generates a fresh TOTP secret for the current user.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn new_totp(&self) -> AuthResult<NewTotp> {
        self.requester
            .request_json(ApiRequest::post(endpoints::USERS_NEW_TOTP))
            .await
    }

    /// Enables TOTP with a verified code.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn enable_totp(&self, payload: &EnableTotp) -> AuthResult<Msg> {
        self.requester
            .request_json(ApiRequest::put(endpoints::LOGIN_TOTP).json(payload)?)
            .await
    }

    /// Disables TOTP.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn disable_totp(&self, payload: &UserProfileUpdate) -> AuthResult<Msg> {
        self.requester
            .request_json(ApiRequest::delete(endpoints::LOGIN_TOTP).json(payload)?)
            .await
    }

    // Users

    /// Profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn profile(&self) -> AuthResult<UserProfile> {
        self.requester
            .request_json(ApiRequest::get(endpoints::USERS))
            .await
    }

    /// Updates the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn update_profile(&self, update: &UserProfileUpdate) -> AuthResult<UserProfile> {
        self.requester
            .request_json(ApiRequest::put(endpoints::USERS).json(update)?)
            .await
    }

    /// Open self-registration.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn create_profile(&self, create: &UserProfileCreate) -> AuthResult<UserProfile> {
        self.send_json(ApiRequest::post(endpoints::USERS).json(create)?)
            .await
    }

    /// Sends the email validation message.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn send_validation_email(&self) -> AuthResult<Msg> {
        self.requester
            .request_json(ApiRequest::post(endpoints::USERS_SEND_VALIDATION))
            .await
    }

    /// Confirms the email address with the code from the validation message.
    ///
    /// # Errors
    ///
    /// Requester, status, and decode errors.
    pub async fn validate_email(&self, validation: &str) -> AuthResult<Msg> {
        let request = ApiRequest::post(endpoints::USERS_VALIDATE_EMAIL)
            .json(&json!({ "validation": validation }))?;
        self.requester.request_json(request).await
    }

    // Recovery

    /// Starts password recovery.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn recover_password(&self, email: &str) -> AuthResult<RecoveryAck> {
        self.send_json(ApiRequest::post(endpoints::with_email(
            endpoints::LOGIN_RECOVER,
            email,
        )))
        .await
    }

    /// Sets a new password with the token from the recovery email.
    ///
    /// # Errors
    ///
    /// Transport, status, and decode errors.
    pub async fn reset_password(
        &self,
        recovery_token: &str,
        claim: &str,
        new_password: &str,
    ) -> AuthResult<Msg> {
        let request = ApiRequest::post(endpoints::LOGIN_RESET)
            .bearer(recovery_token)
            .json(&json!({ "new_password": new_password, "claim": claim }))?;
        self.send_json(request).await
    }
}

impl std::fmt::Debug for BackendApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendApi").finish_non_exhaustive()
    }
}

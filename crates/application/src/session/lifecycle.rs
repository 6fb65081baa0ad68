//! Session operations on top of the requester and the refresh coordinator.
//!
//! Every operation catches failures at its boundary: it logs the error,
//! queues exactly one notice, and hands the typed error back. Operations
//! that change the tokens persist the session afterwards when a repository
//! is configured.

use std::sync::Arc;

use tokenwarden_domain::{
    AuthError, AuthResult, EnableTotp, Msg, NewTotp, Notice, RecoveryAck, TokenPair, UserProfile,
    UserProfileCreate, UserProfileUpdate,
};
use tracing::{debug, info, warn};

use super::{Credentials, Freshness, LoginOutcome};
use crate::api::BackendApi;
use crate::auth::{AuthenticatedRequester, RefreshCoordinator, SessionContext, TokenCodec};
use crate::ports::{Clock, HttpTransport, SessionRepository, SessionStoreError};

/// Orchestrates login, logout, and proactive refresh for one session.
pub struct SessionLifecycle {
    context: Arc<SessionContext>,
    codec: TokenCodec,
    refresher: Arc<RefreshCoordinator>,
    api: BackendApi,
    repository: Option<Arc<dyn SessionRepository>>,
}

impl SessionLifecycle {
    /// Wires the coordinator, requester, and endpoint catalogue around `context`.
    #[must_use]
    pub fn new(
        context: Arc<SessionContext>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let refresher = Arc::new(RefreshCoordinator::new(context.clone(), transport.clone()));
        let requester = Arc::new(AuthenticatedRequester::new(
            context.clone(),
            transport.clone(),
            refresher.clone(),
        ));
        Self {
            context,
            codec: TokenCodec::new(clock),
            refresher,
            api: BackendApi::new(requester, transport),
            repository: None,
        }
    }

    /// Persists the session through `repository` after token changes.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// The shared session.
    #[must_use]
    pub const fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// The endpoint catalogue.
    #[must_use]
    pub const fn api(&self) -> &BackendApi {
        &self.api
    }

    /// Requester for calls not covered by the catalogue.
    #[must_use]
    pub const fn requester(&self) -> &Arc<AuthenticatedRequester> {
        self.api.requester()
    }

    /// The refresh coordinator shared with the requester.
    #[must_use]
    pub const fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }

    /// Token inspection against this session's clock.
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    // Persistence

    /// Loads the persisted session into the context.
    ///
    /// Returns `false` when nothing was persisted.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the stored session cannot be read.
    pub async fn restore(&self) -> Result<bool, SessionStoreError> {
        let Some(repository) = &self.repository else {
            return Ok(false);
        };
        match repository.load().await? {
            Some(state) => {
                debug!(logged_in = state.is_logged_in(), "Restored persisted session");
                self.context.restore(state).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes the current session to the repository, if any.
    pub async fn persist(&self) {
        let Some(repository) = &self.repository else {
            return;
        };
        let state = self.context.snapshot().await;
        if let Err(error) = repository.save(&state).await {
            warn!(%error, "Failed to persist session");
        }
    }

    async fn forget(&self) {
        let Some(repository) = &self.repository else {
            return;
        };
        if let Err(error) = repository.clear().await {
            warn!(%error, "Failed to clear persisted session");
        }
    }

    // Login and logout

    /// Logs in with a password or starts a magic link login.
    ///
    /// # Errors
    ///
    /// Any failure leaves the session anonymous and queues a notice.
    pub async fn login(&self, credentials: Credentials) -> AuthResult<LoginOutcome> {
        debug!(username = credentials.username(), "Logging in");
        let result = match &credentials {
            Credentials::Password { username, password } => {
                match self.api.login_with_password(username, password).await {
                    Ok(pair) => self.establish(pair).await,
                    Err(error) => Err(error),
                }
            }
            Credentials::MagicLink { username } => self.start_magic_link(username).await,
        };

        match result {
            Ok(outcome) => {
                info!(?outcome, "Login succeeded");
                self.persist().await;
                Ok(outcome)
            }
            Err(error) => {
                self.terminate().await;
                self.fail("login", error, login_error()).await
            }
        }
    }

    async fn start_magic_link(&self, email: &str) -> AuthResult<LoginOutcome> {
        let token = self.api.request_magic_link(email).await?;
        if token.claim.is_empty() {
            return Err(AuthError::decode("magic link response carried no claim"));
        }
        self.context.clear_credentials().await;
        self.context.tokens().set_claim(token.claim).await;
        Ok(LoginOutcome::MagicLinkSent)
    }

    /// Redeems the token from a magic link email.
    ///
    /// The token must carry the same fingerprint as the claim this session
    /// received when the link was requested. When it does not, nothing is
    /// sent, nothing is stored, and no notice is queued.
    ///
    /// # Errors
    ///
    /// [`AuthError::StateInconsistency`] on a fingerprint mismatch. Other
    /// failures end the session and queue a notice.
    pub async fn claim(&self, redeemed: &str) -> AuthResult<LoginOutcome> {
        let local = self.context.tokens().access_token().await.unwrap_or_default();
        if !self.codec.fingerprints_match(&local, redeemed) {
            debug!("Magic link fingerprint does not match the held claim, ignoring");
            return Err(AuthError::StateInconsistency {
                message: "magic link was issued to a different session".to_string(),
            });
        }

        let result = match self.api.claim_magic_link(redeemed, &local).await {
            Ok(pair) => self.establish(pair).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(outcome) => {
                info!(?outcome, "Magic link redeemed");
                self.persist().await;
                Ok(outcome)
            }
            Err(error) => {
                self.terminate().await;
                self.fail("claim", error, claim_error()).await
            }
        }
    }

    /// Completes a login that stopped at [`LoginOutcome::TotpRequired`].
    ///
    /// # Errors
    ///
    /// A rejected code leaves the session as it was and queues a notice.
    pub async fn totp_login(&self, code: &str) -> AuthResult<LoginOutcome> {
        let claim = match self.context.tokens().access_token().await {
            Some(claim) if self.codec.is_totp(&claim) => claim,
            _ => {
                return self
                    .fail("totp_login", AuthError::NotAuthenticated, totp_error())
                    .await;
            }
        };

        let pair = match self.api.login_with_totp(&claim, code).await {
            Ok(pair) => pair,
            Err(error) => return self.fail("totp_login", error, totp_error()).await,
        };
        match self.establish(pair).await {
            Ok(outcome) => {
                info!(?outcome, "Two-factor login succeeded");
                self.persist().await;
                Ok(outcome)
            }
            Err(error) => {
                self.terminate().await;
                self.fail("totp_login", error, login_error()).await
            }
        }
    }

    /// Stores a freshly issued pair and loads the profile unless a TOTP code
    /// is still needed.
    async fn establish(&self, pair: TokenPair) -> AuthResult<LoginOutcome> {
        if pair.access_token.is_empty() {
            return Err(AuthError::decode("login response carried no access token"));
        }
        let needs_totp = self.codec.is_totp(&pair.access_token);
        self.context.set_tokens(pair).await;
        if needs_totp {
            return Ok(LoginOutcome::TotpRequired);
        }
        self.load_profile().await?;
        Ok(LoginOutcome::Authenticated)
    }

    /// Revokes the refresh token (best effort) and clears the session.
    pub async fn logout(&self) {
        self.terminate().await;
        info!("Logged out");
    }

    async fn terminate(&self) {
        if let Some(refresh_token) = self.context.tokens().refresh_token().await {
            match self.api.revoke(&refresh_token).await {
                Ok(_) => debug!("Refresh token revoked"),
                Err(error) => warn!(%error, "Failed to revoke refresh token"),
            }
        }
        self.context.end_session().await;
        self.forget().await;
    }

    /// Renews the access token when it has expired.
    ///
    /// Calling it again while the access token is valid sends nothing.
    pub async fn ensure_fresh(&self) -> Freshness {
        let tokens = self.context.tokens().get().await;
        if !tokens.access_token.is_empty() && !self.codec.is_expired(&tokens.access_token) {
            return Freshness::Valid;
        }

        if tokens.refresh_token.is_empty() || self.codec.is_expired(&tokens.refresh_token) {
            debug!("Refresh token missing or expired, ending session");
            self.context.clear_credentials().await;
            self.forget().await;
            return Freshness::SessionEnded;
        }

        match self.refresher.refresh().await {
            Ok(Some(_)) => {
                self.persist().await;
                Freshness::Refreshed
            }
            Ok(None) | Err(_) => {
                self.context.end_session().await;
                self.forget().await;
                self.context.notices().push(Notice::session_expired()).await;
                Freshness::SessionEnded
            }
        }
    }

    // Profile

    /// Loads the profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// A failure ends the session and queues a notice.
    pub async fn fetch_profile(&self) -> AuthResult<UserProfile> {
        match self.load_profile().await {
            Ok(profile) => {
                self.persist().await;
                Ok(profile)
            }
            Err(error) => {
                self.terminate().await;
                self.fail("fetch_profile", error, login_error()).await
            }
        }
    }

    async fn load_profile(&self) -> AuthResult<UserProfile> {
        let profile = self.api.profile().await.and_then(loaded)?;
        self.context.set_profile(profile.clone()).await;
        Ok(profile)
    }

    /// Updates the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] when not logged in; request failures
    /// otherwise. Both queue a notice.
    pub async fn update_profile(&self, update: &UserProfileUpdate) -> AuthResult<UserProfile> {
        self.require_login("update_profile").await?;
        let profile = match self.api.update_profile(update).await.and_then(loaded) {
            Ok(profile) => profile,
            Err(error) => {
                return self
                    .fail(
                        "update_profile",
                        error,
                        Notice::error(
                            "Profile update error",
                            "Please check your submission, or internet connection, and try again.",
                        ),
                    )
                    .await;
            }
        };
        self.context.set_profile(profile.clone()).await;
        self.notify(Notice::success(
            "Profile update",
            "Your settings have been updated.",
        ))
        .await;
        self.persist().await;
        Ok(profile)
    }

    /// Open self-registration. The returned profile is stored; tokens still
    /// come from a login.
    ///
    /// # Errors
    ///
    /// Request failures queue a notice.
    pub async fn register(&self, create: &UserProfileCreate) -> AuthResult<UserProfile> {
        let profile = match self.api.create_profile(create).await.and_then(loaded) {
            Ok(profile) => profile,
            Err(error) => {
                return self
                    .fail(
                        "register",
                        error,
                        Notice::error(
                            "Login creation error",
                            "Please check your details, or internet connection, and try again.",
                        ),
                    )
                    .await;
            }
        };
        self.context.set_profile(profile.clone()).await;
        self.persist().await;
        Ok(profile)
    }

    // Two-factor

    /// Asks the backend for a new TOTP secret.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] when not logged in; request failures
    /// otherwise. Both queue a notice.
    pub async fn request_new_totp(&self) -> AuthResult<NewTotp> {
        self.require_login("request_new_totp").await?;
        match self.api.new_totp().await {
            Ok(totp) => Ok(totp),
            Err(error) => {
                let notice = Notice::from_error(&error);
                self.fail("request_new_totp", error, notice).await
            }
        }
    }

    /// Enables TOTP; the profile flag flips only on acknowledgement.
    ///
    /// # Errors
    ///
    /// Not logged in, request failure, or a missing acknowledgement. Each
    /// queues a notice.
    pub async fn enable_totp(&self, payload: &EnableTotp) -> AuthResult<String> {
        self.require_login("enable_totp").await?;
        match self.api.enable_totp(payload).await.and_then(acknowledged) {
            Ok(msg) => {
                self.context.update_profile(|p| p.totp_enabled = true).await;
                self.notify(Notice::success("Two-factor authentication", msg.clone()))
                    .await;
                self.persist().await;
                Ok(msg)
            }
            Err(error) => {
                self.fail(
                    "enable_totp",
                    error,
                    Notice::error(
                        "Error enabling two-factor authentication",
                        "Please check your submission, or internet connection, and try again.",
                    ),
                )
                .await
            }
        }
    }

    /// Disables TOTP; the profile flag flips only on acknowledgement.
    ///
    /// # Errors
    ///
    /// Not logged in, request failure, or a missing acknowledgement. Each
    /// queues a notice.
    pub async fn disable_totp(&self, payload: &UserProfileUpdate) -> AuthResult<String> {
        self.require_login("disable_totp").await?;
        match self.api.disable_totp(payload).await.and_then(acknowledged) {
            Ok(msg) => {
                self.context.update_profile(|p| p.totp_enabled = false).await;
                self.notify(Notice::success("Two-factor authentication", msg.clone()))
                    .await;
                self.persist().await;
                Ok(msg)
            }
            Err(error) => {
                self.fail(
                    "disable_totp",
                    error,
                    Notice::error(
                        "Error disabling two-factor authentication",
                        "Please check your submission, or internet connection, and try again.",
                    ),
                )
                .await
            }
        }
    }

    // Email validation

    /// Asks the backend to send the validation email.
    ///
    /// Returns `Ok(None)` without a request when the email is already
    /// validated.
    ///
    /// # Errors
    ///
    /// No access token, request failure, or a missing acknowledgement. Each
    /// queues a notice.
    pub async fn send_email_validation(&self) -> AuthResult<Option<String>> {
        if !self.email_needs_validation("send_email_validation").await? {
            return Ok(None);
        }
        match self.api.send_validation_email().await.and_then(acknowledged) {
            Ok(msg) => {
                self.notify(Notice::success("Validation sent", msg.clone()))
                    .await;
                Ok(Some(msg))
            }
            Err(error) => {
                self.fail(
                    "send_email_validation",
                    error,
                    Notice::error("Validation error", "Please check your email and try again."),
                )
                .await
            }
        }
    }

    /// Confirms the email with the code from the validation email.
    ///
    /// Returns `Ok(None)` without a request when already validated.
    ///
    /// # Errors
    ///
    /// No access token, request failure, or a missing acknowledgement. Each
    /// queues a notice.
    pub async fn validate_email(&self, validation: &str) -> AuthResult<Option<String>> {
        if !self.email_needs_validation("validate_email").await? {
            return Ok(None);
        }
        match self.api.validate_email(validation).await.and_then(acknowledged) {
            Ok(msg) => {
                self.context.update_profile(|p| p.email_validated = true).await;
                self.notify(Notice::success("Success", msg.clone())).await;
                self.persist().await;
                Ok(Some(msg))
            }
            Err(error) => {
                self.fail(
                    "validate_email",
                    error,
                    Notice::error(
                        "Validation error",
                        "Invalid token. Check your email and resend validation.",
                    ),
                )
                .await
            }
        }
    }

    async fn email_needs_validation(&self, operation: &'static str) -> AuthResult<bool> {
        if self.context.tokens().access_token().await.is_none() {
            let error = AuthError::NotAuthenticated;
            let notice = Notice::from_error(&error);
            return self.fail(operation, error, notice).await;
        }
        let validated = self
            .context
            .profile()
            .await
            .is_some_and(|p| p.email_validated);
        if validated {
            debug!(operation, "Email already validated");
        }
        Ok(!validated)
    }

    // Password recovery

    /// Starts password recovery. Does nothing while logged in.
    ///
    /// # Errors
    ///
    /// A failure drops any held claim and queues a notice.
    pub async fn recover_password(&self, email: &str) -> AuthResult<()> {
        if self.context.is_logged_in().await {
            debug!("Password recovery skipped while logged in");
            return Ok(());
        }

        let held = match self.api.recover_password(email).await.and_then(held_claim) {
            Ok(held) => held,
            Err(error) => {
                self.context.tokens().clear().await;
                self.forget().await;
                return self.fail("recover_password", error, login_error()).await;
            }
        };

        if let Some(claim) = held {
            self.context.tokens().set_claim(claim).await;
            self.persist().await;
        }
        self.notify(Notice::success(
            "Success",
            "If that login exists, we'll send you an email to reset your password.",
        ))
        .await;
        Ok(())
    }

    /// Sets a new password using the token from the recovery email.
    ///
    /// Does nothing while logged in. The token's fingerprint must match the
    /// claim held since [`recover_password`](Self::recover_password); when it
    /// does not, nothing is sent and no notice is queued.
    ///
    /// # Errors
    ///
    /// [`AuthError::StateInconsistency`] on a fingerprint mismatch. Other
    /// failures drop the held claim and queue a notice.
    pub async fn reset_password(&self, new_password: &str, token: &str) -> AuthResult<()> {
        if self.context.is_logged_in().await {
            debug!("Password reset skipped while logged in");
            return Ok(());
        }

        let local = self.context.tokens().access_token().await.unwrap_or_default();
        if !self.codec.fingerprints_match(&local, token) {
            debug!("Recovery token fingerprint does not match the held claim, ignoring");
            return Err(AuthError::StateInconsistency {
                message: "recovery token was issued to a different session".to_string(),
            });
        }

        let result = self
            .api
            .reset_password(token, &local, new_password)
            .await
            .and_then(acknowledged);
        self.context.tokens().clear().await;
        self.forget().await;
        match result {
            Ok(msg) => {
                self.notify(Notice::success("Success", msg)).await;
                Ok(())
            }
            Err(error) => self.fail("reset_password", error, claim_error()).await,
        }
    }

    // Failure handling

    async fn require_login(&self, operation: &'static str) -> AuthResult<()> {
        if self.context.is_logged_in().await {
            return Ok(());
        }
        let error = AuthError::NotAuthenticated;
        let notice = Notice::from_error(&error);
        self.fail(operation, error, notice).await
    }

    async fn notify(&self, notice: Notice) {
        self.context.notices().push(notice).await;
    }

    /// Logs `error`, queues one notice, and returns the error.
    ///
    /// `notice` is the operation's own copy; authentication loss, network
    /// trouble, and field rejections get their specific wording instead.
    async fn fail<T>(
        &self,
        operation: &'static str,
        error: AuthError,
        notice: Notice,
    ) -> AuthResult<T> {
        warn!(operation, %error, "Session operation failed");
        let notice = match &error {
            terminal if terminal.is_session_terminal() => {
                self.terminate().await;
                Notice::session_expired()
            }
            AuthError::NetworkFailure { .. } => Notice::from_error(&error),
            AuthError::ValidationFailed { message, .. } if !message.is_empty() => {
                Notice::error(notice.title, message.clone())
            }
            _ => notice,
        };
        self.notify(notice).await;
        Err(error)
    }
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("refresher", &self.refresher)
            .field("persistent", &self.repository.is_some())
            .finish_non_exhaustive()
    }
}

fn acknowledged(ack: Msg) -> AuthResult<String> {
    ack.acknowledged()
        .map(str::to_string)
        .ok_or_else(|| AuthError::decode("backend did not acknowledge the request"))
}

fn loaded(profile: UserProfile) -> AuthResult<UserProfile> {
    if profile.is_loaded() {
        Ok(profile)
    } else {
        Err(AuthError::decode("profile response carried no id"))
    }
}

fn held_claim(ack: RecoveryAck) -> AuthResult<Option<String>> {
    match ack {
        RecoveryAck::Claim(token) if !token.claim.is_empty() => Ok(Some(token.claim)),
        RecoveryAck::Message(msg) if msg.acknowledged().is_some() => Ok(None),
        _ => Err(AuthError::decode("recovery response was empty")),
    }
}

fn login_error() -> Notice {
    Notice::error(
        "Login error",
        "Please check your details or internet connection and try again.",
    )
}

fn claim_error() -> Notice {
    Notice::error(
        "Login error",
        "Ensure you're using the same device and that the token hasn't expired.",
    )
}

fn totp_error() -> Notice {
    Notice::error(
        "Two-factor error",
        "Unable to validate your verification code. Make sure it is the latest.",
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeTransport, ManualClock, MemoryRepository, jwt, network_down, ok_json, pair_json,
        profile_json, status, unauthorized,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokenwarden_domain::{ApiRequest, ApiResponse, NoticeLevel, SessionState};

    const NOW: i64 = 10_000;

    struct Harness {
        lifecycle: SessionLifecycle,
        transport: Arc<FakeTransport>,
        repository: Arc<MemoryRepository>,
    }

    impl Harness {
        fn new(
            handler: impl Fn(&ApiRequest) -> AuthResult<ApiResponse> + Send + Sync + 'static,
        ) -> Self {
            let transport = FakeTransport::new(handler);
            let repository = MemoryRepository::new();
            let lifecycle = SessionLifecycle::new(
                Arc::new(SessionContext::new()),
                transport.clone(),
                ManualClock::at_epoch_secs(NOW),
            )
            .with_repository(repository.clone());
            Self {
                lifecycle,
                transport,
                repository,
            }
        }

        fn context(&self) -> &Arc<SessionContext> {
            self.lifecycle.context()
        }

        async fn seed(&self, access: &str, refresh: &str, profile: Option<UserProfile>) {
            self.context()
                .restore(SessionState {
                    tokens: TokenPair::new(access, refresh, "bearer"),
                    profile,
                })
                .await;
        }

        async fn seed_logged_in(&self) {
            self.seed(&valid_access(), &valid_refresh(), Some(profile()))
                .await;
        }

        async fn notices(&self) -> Vec<Notice> {
            self.context().notices().pending().await
        }
    }

    fn profile() -> UserProfile {
        serde_json::from_value(profile_json()).unwrap()
    }

    fn valid_access() -> String {
        jwt().sub("u1").exp(NOW + 600).build()
    }

    fn expired_access() -> String {
        jwt().sub("u1").exp(NOW - 1).build()
    }

    fn valid_refresh() -> String {
        jwt().sub("u1").exp(NOW + 86_400).build()
    }

    fn ack(msg: &str) -> AuthResult<ApiResponse> {
        ok_json(&json!({ "msg": msg }))
    }

    // Freshness

    #[tokio::test]
    async fn test_ensure_fresh_with_valid_token_is_idempotent() {
        let harness = Harness::new(|_| panic!("no request expected"));
        harness.seed_logged_in().await;

        assert_eq!(harness.lifecycle.ensure_fresh().await, Freshness::Valid);
        assert_eq!(harness.lifecycle.ensure_fresh().await, Freshness::Valid);
        assert_eq!(harness.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_fresh_refreshes_expired_access_token() {
        let fresh = valid_access();
        let next_refresh = valid_refresh();
        let (a, r) = (fresh.clone(), next_refresh.clone());
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/refresh" => ok_json(&pair_json(&a, &r)),
            path => panic!("unexpected path {path}"),
        });
        let old_refresh = valid_refresh();
        harness
            .seed(&expired_access(), &old_refresh, Some(profile()))
            .await;

        assert_eq!(harness.lifecycle.ensure_fresh().await, Freshness::Refreshed);

        assert_eq!(harness.transport.calls_to("/login/refresh"), 1);
        assert_eq!(
            harness.transport.calls()[0].bearer.as_deref(),
            Some(old_refresh.as_str())
        );
        assert_eq!(
            harness.context().tokens().get().await,
            TokenPair::new(fresh, next_refresh, "bearer")
        );
        assert!(harness.notices().await.is_empty());
        assert!(harness.repository.stored().unwrap().is_logged_in());

        assert_eq!(harness.lifecycle.ensure_fresh().await, Freshness::Valid);
        assert_eq!(harness.transport.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_ends_session_with_one_notice() {
        let harness = Harness::new(|request| match request.path.as_str() {
            "/login/refresh" => unauthorized(),
            path => panic!("unexpected path {path}"),
        });
        harness
            .seed(&expired_access(), &valid_refresh(), Some(profile()))
            .await;
        harness
            .context()
            .notices()
            .push(Notice::info("Earlier", "notice"))
            .await;

        assert_eq!(
            harness.lifecycle.ensure_fresh().await,
            Freshness::SessionEnded
        );

        assert_eq!(harness.transport.total_calls(), 1);
        assert!(harness.context().snapshot().await.is_anonymous());
        assert_eq!(harness.notices().await, vec![Notice::session_expired()]);
        assert_eq!(harness.repository.stored(), None);
    }

    #[tokio::test]
    async fn test_expired_refresh_token_ends_session_without_calls() {
        let harness = Harness::new(|_| panic!("no request expected"));
        let stale_refresh = jwt().exp(NOW - 60).build();
        harness
            .seed(&expired_access(), &stale_refresh, Some(profile()))
            .await;

        assert_eq!(
            harness.lifecycle.ensure_fresh().await,
            Freshness::SessionEnded
        );
        assert_eq!(harness.transport.total_calls(), 0);
        assert!(harness.context().snapshot().await.is_anonymous());
    }

    // Login

    #[tokio::test]
    async fn test_password_login_loads_profile() {
        let access = valid_access();
        let refresh = valid_refresh();
        let (a, r) = (access.clone(), refresh.clone());
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/oauth" => ok_json(&pair_json(&a, &r)),
            "/users/" => ok_json(&profile_json()),
            path => panic!("unexpected path {path}"),
        });

        let outcome = harness
            .lifecycle
            .login(Credentials::password("ada@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Authenticated);
        assert!(harness.context().is_logged_in().await);
        assert!(!harness.context().is_admin().await);
        let users_call = &harness.transport.calls()[1];
        assert_eq!(users_call.bearer.as_deref(), Some(access.as_str()));
        assert_eq!(
            harness.repository.stored().unwrap().tokens,
            TokenPair::new(access, refresh, "bearer")
        );
    }

    #[tokio::test]
    async fn test_login_accepts_profile_with_null_fields() {
        let access = valid_access();
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/oauth" => ok_json(&pair_json(&access, "refresh")),
            "/users/" => {
                let mut profile = profile_json();
                profile["full_name"] = Value::Null;
                profile["is_superuser"] = Value::Null;
                ok_json(&profile)
            }
            path => panic!("unexpected path {path}"),
        });

        let outcome = harness
            .lifecycle
            .login(Credentials::password("ada@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Authenticated);
        assert!(harness.context().is_logged_in().await);
        let profile = harness.context().profile().await.unwrap();
        assert_eq!(profile.full_name, "");
        assert!(harness.notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_totp_token_skips_profile_until_code_is_sent() {
        let totp_claim = jwt().totp().exp(NOW + 300).build();
        let access = valid_access();
        let (claim, a) = (totp_claim.clone(), access.clone());
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/oauth" => ok_json(&json!({
                "access_token": claim,
                "refresh_token": null,
                "token_type": "bearer",
            })),
            "/login/totp" => ok_json(&pair_json(&a, "refresh")),
            "/users/" => ok_json(&profile_json()),
            path => panic!("unexpected path {path}"),
        });

        let outcome = harness
            .lifecycle
            .login(Credentials::password("ada@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::TotpRequired);
        assert_eq!(harness.transport.calls_to("/users/"), 0);
        assert!(!harness.context().is_logged_in().await);

        let outcome = harness.lifecycle.totp_login("123456").await.unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated);

        let totp_call = &harness.transport.calls()[1];
        assert_eq!(totp_call.path, "/login/totp");
        assert_eq!(totp_call.bearer.as_deref(), Some(totp_claim.as_str()));
        assert!(harness.context().is_logged_in().await);
    }

    #[tokio::test]
    async fn test_rejected_totp_code_keeps_claim() {
        let totp_claim = jwt().totp().exp(NOW + 300).build();
        let harness = Harness::new(|_| status(400, &json!({ "detail": "Invalid code" })));
        harness.context().tokens().set_claim(totp_claim.clone()).await;

        let error = harness.lifecycle.totp_login("000000").await.unwrap_err();

        assert!(matches!(error, AuthError::ValidationFailed { .. }));
        assert_eq!(
            harness.context().tokens().access_token().await,
            Some(totp_claim)
        );
        let notices = harness.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Two-factor error");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_anonymous() {
        let harness = Harness::new(|_| status(400, &json!({ "detail": "Incorrect email or password" })));

        let error = harness
            .lifecycle
            .login(Credentials::password("ada@example.com", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::ValidationFailed { .. }));
        assert!(harness.context().snapshot().await.is_anonymous());
        let notices = harness.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Login error");
        assert_eq!(notices[0].content, "Incorrect email or password");
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_network_failure_during_login() {
        let harness = Harness::new(|_| network_down());

        harness
            .lifecycle
            .login(Credentials::magic_link("ada@example.com"))
            .await
            .unwrap_err();

        assert_eq!(harness.notices().await[0].title, "Network error");
    }

    // Magic link

    #[tokio::test]
    async fn test_magic_link_round_trip() {
        let local = jwt().fingerprint("device-1").exp(NOW + 900).build();
        let redeemed = jwt().fingerprint("device-1").exp(NOW + 900).build();
        let access = valid_access();
        let (l, a) = (local.clone(), access.clone());
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/magic/ada%40example.com" => ok_json(&json!({ "claim": l })),
            "/login/claim" => ok_json(&pair_json(&a, "refresh")),
            "/users/" => ok_json(&profile_json()),
            path => panic!("unexpected path {path}"),
        });

        let outcome = harness
            .lifecycle
            .login(Credentials::magic_link("ada@example.com"))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::MagicLinkSent);
        assert_eq!(
            harness.context().tokens().get().await,
            TokenPair::claim_only(local.clone())
        );
        assert_eq!(harness.transport.calls_to("/users/"), 0);

        let outcome = harness.lifecycle.claim(&redeemed).await.unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated);

        let claim_call = &harness.transport.calls()[1];
        assert_eq!(claim_call.bearer.as_deref(), Some(redeemed.as_str()));
        assert_eq!(
            claim_call.body,
            tokenwarden_domain::RequestBody::Json(json!({ "claim": local }))
        );
        assert!(harness.context().is_logged_in().await);
    }

    #[tokio::test]
    async fn test_magic_link_fingerprint_mismatch_is_silent() {
        let harness = Harness::new(|_| panic!("no request expected"));
        let local = jwt().fingerprint("device-1").build();
        harness.context().tokens().set_claim(local.clone()).await;

        let redeemed = jwt().fingerprint("device-2").build();
        let error = harness.lifecycle.claim(&redeemed).await.unwrap_err();

        assert!(matches!(error, AuthError::StateInconsistency { .. }));
        assert_eq!(harness.transport.calls_to("/login/claim"), 0);
        assert_eq!(
            harness.context().tokens().get().await,
            TokenPair::claim_only(local)
        );
        assert!(harness.notices().await.is_empty());
    }

    // Logout

    #[tokio::test]
    async fn test_logout_without_refresh_token_skips_revoke() {
        let harness = Harness::new(|_| panic!("no request expected"));
        harness.seed(&valid_access(), "", Some(profile())).await;

        harness.lifecycle.logout().await;

        assert_eq!(harness.transport.calls_to("/login/revoke"), 0);
        assert!(harness.context().snapshot().await.is_anonymous());
    }

    #[tokio::test]
    async fn test_logout_revokes_and_survives_revoke_failure() {
        let harness = Harness::new(|_| network_down());
        let refresh = valid_refresh();
        harness
            .seed(&valid_access(), &refresh, Some(profile()))
            .await;
        harness
            .context()
            .notices()
            .push(Notice::info("Old", "notice"))
            .await;
        harness.lifecycle.persist().await;

        harness.lifecycle.logout().await;

        let calls = harness.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/login/revoke");
        assert_eq!(calls[0].bearer.as_deref(), Some(refresh.as_str()));
        assert!(harness.context().snapshot().await.is_anonymous());
        assert!(harness.notices().await.is_empty());
        assert_eq!(harness.repository.stored(), None);
    }

    // Authenticated operations

    #[tokio::test]
    async fn test_enable_totp_requires_acknowledgement() {
        let harness = Harness::new(|_| ack(""));
        harness.seed_logged_in().await;
        let payload = EnableTotp {
            claim: "123456".into(),
            uri: "otpauth://totp/x".into(),
            password: None,
        };

        harness.lifecycle.enable_totp(&payload).await.unwrap_err();

        assert!(!harness.context().profile().await.unwrap().totp_enabled);
        let notices = harness.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Error enabling two-factor authentication");
    }

    #[tokio::test]
    async fn test_enable_then_disable_totp() {
        let harness = Harness::new(|request| match request.method {
            tokenwarden_domain::HttpMethod::Put => ack("TOTP enabled"),
            tokenwarden_domain::HttpMethod::Delete => ack("TOTP disabled"),
            method => panic!("unexpected method {method}"),
        });
        harness.seed_logged_in().await;
        let payload = EnableTotp {
            claim: "123456".into(),
            uri: "otpauth://totp/x".into(),
            password: Some("pw".into()),
        };

        let msg = harness.lifecycle.enable_totp(&payload).await.unwrap();
        assert_eq!(msg, "TOTP enabled");
        assert!(harness.context().profile().await.unwrap().totp_enabled);

        harness
            .lifecycle
            .disable_totp(&UserProfileUpdate {
                original: Some("pw".into()),
                ..UserProfileUpdate::default()
            })
            .await
            .unwrap();
        assert!(!harness.context().profile().await.unwrap().totp_enabled);

        let titles: Vec<_> = harness
            .notices()
            .await
            .into_iter()
            .map(|n| (n.level, n.content))
            .collect();
        assert_eq!(
            titles,
            vec![
                (NoticeLevel::Success, "TOTP enabled".to_string()),
                (NoticeLevel::Success, "TOTP disabled".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_totp_requires_login() {
        let harness = Harness::new(|_| panic!("no request expected"));

        let error = harness.lifecycle.request_new_totp().await.unwrap_err();

        assert_eq!(error, AuthError::NotAuthenticated);
        assert_eq!(harness.notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_during_operation_ends_it() {
        let harness = Harness::new(|request| match request.path.as_str() {
            "/users/" | "/login/refresh" => unauthorized(),
            path => panic!("unexpected path {path}"),
        });
        harness
            .seed(&expired_access(), &valid_refresh(), Some(profile()))
            .await;

        let error = harness
            .lifecycle
            .update_profile(&UserProfileUpdate {
                full_name: Some("Ada L".into()),
                ..UserProfileUpdate::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::AuthenticationFailed { .. }));
        assert!(harness.context().snapshot().await.is_anonymous());
        assert_eq!(harness.notices().await, vec![Notice::session_expired()]);
        assert_eq!(harness.transport.calls_to("/login/refresh"), 1);
    }

    #[tokio::test]
    async fn test_validate_email_marks_profile() {
        let harness = Harness::new(|request| match request.path.as_str() {
            "/users/validate-email" => ack("Email validated"),
            path => panic!("unexpected path {path}"),
        });
        harness.seed_logged_in().await;

        let msg = harness.lifecycle.validate_email("code").await.unwrap();

        assert_eq!(msg.as_deref(), Some("Email validated"));
        assert!(harness.context().profile().await.unwrap().email_validated);
        assert_eq!(harness.lifecycle.validate_email("code").await.unwrap(), None);
        assert_eq!(harness.transport.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_send_validation_without_token_fails() {
        let harness = Harness::new(|_| panic!("no request expected"));

        let error = harness.lifecycle.send_email_validation().await.unwrap_err();

        assert_eq!(error, AuthError::NotAuthenticated);
        assert_eq!(harness.notices().await[0].title, "Unauthorized");
    }

    #[tokio::test]
    async fn test_register_stores_profile() {
        let harness = Harness::new(|request| {
            assert_eq!(request.bearer_token(), None);
            ok_json(&profile_json())
        });

        let profile = harness
            .lifecycle
            .register(&UserProfileCreate {
                email: "ada@example.com".into(),
                password: "pw".into(),
                full_name: None,
            })
            .await
            .unwrap();

        assert_eq!(profile.id, "u1");
        assert_eq!(harness.context().profile().await, Some(profile));
    }

    // Recovery

    #[tokio::test]
    async fn test_recovery_claim_then_reset() {
        let local = jwt().fingerprint("device-1").build();
        let emailed = jwt().fingerprint("device-1").build();
        let l = local.clone();
        let harness = Harness::new(move |request| match request.path.as_str() {
            "/login/recover/ada%40example.com" => ok_json(&json!({ "claim": l })),
            "/login/reset" => ack("Password updated successfully"),
            path => panic!("unexpected path {path}"),
        });

        harness
            .lifecycle
            .recover_password("ada@example.com")
            .await
            .unwrap();
        assert_eq!(
            harness.context().tokens().access_token().await.as_deref(),
            Some(local.as_str())
        );

        harness
            .lifecycle
            .reset_password("n3w-password", &emailed)
            .await
            .unwrap();

        let reset = &harness.transport.calls()[1];
        assert_eq!(reset.bearer.as_deref(), Some(emailed.as_str()));
        assert!(harness.context().tokens().get().await.is_anonymous());
        let contents: Vec<_> = harness
            .notices()
            .await
            .into_iter()
            .map(|n| n.content)
            .collect();
        assert_eq!(contents[1], "Password updated successfully");
    }

    #[tokio::test]
    async fn test_recovery_is_skipped_while_logged_in() {
        let harness = Harness::new(|_| panic!("no request expected"));
        harness.seed_logged_in().await;

        harness
            .lifecycle
            .recover_password("ada@example.com")
            .await
            .unwrap();
        assert_eq!(harness.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_loads_persisted_session() {
        let harness = Harness::new(|_| panic!("no request expected"));
        *harness.repository.state.lock().unwrap() = Some(SessionState {
            tokens: TokenPair::new(valid_access(), valid_refresh(), "bearer"),
            profile: Some(profile()),
        });

        assert!(harness.lifecycle.restore().await.unwrap());
        assert!(harness.context().is_logged_in().await);
    }
}

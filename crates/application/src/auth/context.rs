//! The single session handle shared by every component.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokenwarden_domain::{SessionState, TokenPair, UserProfile};

use super::{NoticeBoard, TokenStore};

/// Owns the session: tokens, the loaded profile and pending notices.
///
/// Build one per session and hand an `Arc` to the requester, the refresh
/// coordinator and the lifecycle. Tokens are mutated only by the refresh
/// coordinator and the lifecycle.
#[derive(Debug, Default)]
pub struct SessionContext {
    tokens: TokenStore,
    profile: RwLock<Option<UserProfile>>,
    notices: NoticeBoard,
}

impl SessionContext {
    /// Creates an anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session from a previously saved snapshot.
    #[must_use]
    pub fn from_state(state: SessionState) -> Self {
        Self {
            tokens: TokenStore::with_tokens(state.tokens),
            profile: RwLock::new(state.profile),
            notices: NoticeBoard::new(),
        }
    }

    /// Wraps a new anonymous session in an `Arc`.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The token store.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Pending notices.
    #[must_use]
    pub const fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Loaded profile, if any.
    pub async fn profile(&self) -> Option<UserProfile> {
        self.profile.read().await.clone()
    }

    /// Replaces the loaded profile.
    pub async fn set_profile(&self, profile: UserProfile) {
        *self.profile.write().await = Some(profile);
    }

    /// Applies `update` to the loaded profile; no-op when none is loaded.
    pub async fn update_profile(&self, update: impl FnOnce(&mut UserProfile)) {
        if let Some(profile) = self.profile.write().await.as_mut() {
            update(profile);
        }
    }

    /// Replaces the whole session with `state`.
    pub async fn restore(&self, state: SessionState) {
        self.tokens.set(state.tokens).await;
        *self.profile.write().await = state.profile;
    }

    /// Consistent copy of tokens and profile.
    pub async fn snapshot(&self) -> SessionState {
        SessionState {
            tokens: self.tokens.get().await,
            profile: self.profile().await,
        }
    }

    /// Profile id present and all three token fields non-empty.
    pub async fn is_logged_in(&self) -> bool {
        self.snapshot().await.is_logged_in()
    }

    /// Logged in, superuser and active.
    pub async fn is_admin(&self) -> bool {
        self.snapshot().await.is_admin()
    }

    /// Drops tokens and profile but keeps pending notices.
    pub async fn clear_credentials(&self) {
        self.tokens.clear().await;
        *self.profile.write().await = None;
    }

    /// Local half of logout: tokens, profile and pending notices are cleared.
    pub async fn end_session(&self) {
        self.clear_credentials().await;
        self.notices.clear().await;
    }

    /// Stores a freshly issued pair.
    pub async fn set_tokens(&self, pair: TokenPair) {
        self.tokens.set(pair).await;
    }
}

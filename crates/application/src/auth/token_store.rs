//! In-memory token storage.
//!
//! The store is a plain value holder: it performs no validation and no
//! expiry checks. Clones share the same underlying pair, so every component
//! holding a handle sees writes immediately.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokenwarden_domain::TokenPair;

/// Thread-safe holder of the current token pair.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    tokens: Arc<RwLock<TokenPair>>,
}

impl TokenStore {
    /// Create an empty (anonymous) store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `pair`.
    #[must_use]
    pub fn with_tokens(pair: TokenPair) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(pair)),
        }
    }

    /// Current pair.
    pub async fn get(&self) -> TokenPair {
        self.tokens.read().await.clone()
    }

    /// Replace the pair.
    pub async fn set(&self, pair: TokenPair) {
        *self.tokens.write().await = pair;
    }

    /// Park a one-time claim in the access slot and empty the other fields.
    pub async fn set_claim(&self, claim: impl Into<String>) {
        *self.tokens.write().await = TokenPair::claim_only(claim);
    }

    /// Reset to the anonymous pair.
    pub async fn clear(&self) {
        *self.tokens.write().await = TokenPair::anonymous();
    }

    /// Access token, or `None` when empty.
    pub async fn access_token(&self) -> Option<String> {
        let tokens = self.tokens.read().await;
        (!tokens.access_token.is_empty()).then(|| tokens.access_token.clone())
    }

    /// Refresh token, or `None` when empty.
    pub async fn refresh_token(&self) -> Option<String> {
        let tokens = self.tokens.read().await;
        (!tokens.refresh_token.is_empty()).then(|| tokens.refresh_token.clone())
    }
}

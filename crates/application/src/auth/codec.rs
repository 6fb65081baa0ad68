//! Token inspection against the injected clock.

use std::sync::Arc;

use tokenwarden_domain::Claims;

use crate::ports::Clock;

/// Reads claims out of tokens and answers expiry questions.
///
/// Everything here is fail-closed: a token that cannot be decoded is
/// expired, has no fingerprint, and is not a TOTP token.
#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec that evaluates expiry against `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Decodes the token payload without checking the signature.
    #[must_use]
    pub fn decode(&self, token: &str) -> Claims {
        Claims::decode(token)
    }

    /// True when `exp` is at or before now, missing, or unreadable.
    #[must_use]
    pub fn is_expired(&self, token: &str) -> bool {
        Claims::decode(token).is_expired_at(self.clock.now())
    }

    /// The `fingerprint` claim, if present.
    #[must_use]
    pub fn fingerprint(&self, token: &str) -> Option<String> {
        Claims::decode(token).fingerprint
    }

    /// True for the intermediate token that still needs a TOTP code.
    #[must_use]
    pub fn is_totp(&self, token: &str) -> bool {
        Claims::decode(token).is_totp()
    }

    /// Both tokens carry a fingerprint and the fingerprints are equal.
    #[must_use]
    pub fn fingerprints_match(&self, a: &str, b: &str) -> bool {
        match (self.fingerprint(a), self.fingerprint(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Seconds until the token expires, `None` when expired or unreadable.
    #[must_use]
    pub fn seconds_until_expiry(&self, token: &str) -> Option<i64> {
        Claims::decode(token).seconds_until_expiry(self.clock.now())
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

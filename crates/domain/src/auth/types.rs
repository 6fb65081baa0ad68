//! Token and acknowledgement payloads exchanged with the backend

use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued by the backend.
///
/// Either all three fields are non-empty (authenticated) or all are empty
/// (anonymous). The only exception is a one-time claim parked in
/// `access_token` during the magic-link and recovery flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub access_token: String,
    /// Long-lived credential used only against `/login/refresh` and `/login/revoke`.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub refresh_token: String,
    /// Token type reported by the backend, usually "bearer".
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub token_type: String,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: token_type.into(),
        }
    }

    /// The anonymous (empty) pair.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A pair holding only a one-time claim in the access slot.
    #[must_use]
    pub fn claim_only(claim: impl Into<String>) -> Self {
        Self {
            access_token: claim.into(),
            ..Self::default()
        }
    }

    /// Returns true when all three fields are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && !self.token_type.is_empty()
    }

    /// Returns true when all three fields are empty.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty() && self.token_type.is_empty()
    }
}

/// One-time claim payload (magic link, password recovery, TOTP code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebToken {
    /// The claim value.
    pub claim: String,
}

impl WebToken {
    /// Wraps a claim value.
    #[must_use]
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }
}

/// Plain acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Msg {
    /// Acknowledgement text. Empty means "not acknowledged".
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub msg: String,
}

impl Msg {
    /// Returns the message when the backend actually acknowledged.
    #[must_use]
    pub fn acknowledged(&self) -> Option<&str> {
        (!self.msg.is_empty()).then_some(self.msg.as_str())
    }
}

/// Response of `/login/recover/{email}`: either a message or a claim to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecoveryAck {
    /// The backend handed back a claim for the reset step.
    Claim(WebToken),
    /// The backend only acknowledged the request.
    Message(Msg),
}

/// Fresh TOTP secret offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTotp {
    /// Provisioning URI for authenticator apps.
    pub uri: String,
    /// Raw shared secret.
    pub key: String,
}

/// Body of `PUT /login/totp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableTotp {
    /// Code produced by the authenticator for the new secret.
    pub claim: String,
    /// Provisioning URI returned by `/users/new-totp`.
    pub uri: String,
    /// Current password, when the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

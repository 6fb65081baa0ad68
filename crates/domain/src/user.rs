//! User profile payloads

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user as returned by `/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    /// User identifier. Empty means "no profile loaded".
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub id: String,
    /// Login email.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub email: String,
    /// Whether the email address has been confirmed.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub email_validated: bool,
    /// Whether the account is enabled.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub is_active: bool,
    /// Whether the account has administrative rights.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub is_superuser: bool,
    /// Display name.
    #[serde(
        default,
        alias = "fullName",
        deserialize_with = "crate::wire::null_as_default"
    )]
    pub full_name: String,
    /// Whether a password is set (magic-link-only accounts have none).
    #[serde(
        default,
        rename = "password",
        deserialize_with = "crate::wire::null_as_default"
    )]
    pub has_password: bool,
    /// Whether TOTP two-factor authentication is enabled.
    #[serde(
        default,
        rename = "totp",
        deserialize_with = "crate::wire::null_as_default"
    )]
    pub totp_enabled: bool,
}

impl UserProfile {
    /// Returns true when the profile carries an id.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Partial update sent to `PUT /users/` and `DELETE /login/totp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserProfileUpdate {
    /// New email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// New password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Current password, required by the backend when changing credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

/// Body of the open self-registration endpoint `POST /users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileCreate {
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

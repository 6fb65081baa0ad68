//! Backend paths, relative to the API base URL.

/// Password grant.
pub const LOGIN_OAUTH: &str = "/login/oauth";
/// Magic link request prefix; the email follows.
pub const LOGIN_MAGIC: &str = "/login/magic";
/// Magic link redemption.
pub const LOGIN_CLAIM: &str = "/login/claim";
/// TOTP login, enable (PUT) and disable (DELETE).
pub const LOGIN_TOTP: &str = "/login/totp";
/// Token refresh.
pub const LOGIN_REFRESH: &str = "/login/refresh";
/// Refresh token revocation.
pub const LOGIN_REVOKE: &str = "/login/revoke";
/// Password recovery prefix; the email follows.
pub const LOGIN_RECOVER: &str = "/login/recover";
/// Password reset.
pub const LOGIN_RESET: &str = "/login/reset";
/// Current user profile (GET, PUT) and registration (POST).
pub const USERS: &str = "/users/";
/// New TOTP secret.
pub const USERS_NEW_TOTP: &str = "/users/new-totp";
/// Send the email validation message.
pub const USERS_SEND_VALIDATION: &str = "/users/send-validation-email";
/// Confirm email validation.
pub const USERS_VALIDATE_EMAIL: &str = "/users/validate-email";

/// Appends a percent-encoded email to `prefix`.
#[must_use]
pub fn with_email(prefix: &str, email: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
    format!("{prefix}/{encoded}")
}

//! Inputs and results of session operations.

/// How the user proves who they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Password grant.
    Password {
        /// Login email.
        username: String,
        /// Account password.
        password: String,
    },
    /// Email-only login; the backend mails a link to redeem with
    /// [`SessionLifecycle::claim`](super::SessionLifecycle::claim).
    MagicLink {
        /// Login email.
        username: String,
    },
}

impl Credentials {
    /// Password credentials.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Magic link credentials.
    #[must_use]
    pub fn magic_link(username: impl Into<String>) -> Self {
        Self::MagicLink {
            username: username.into(),
        }
    }

    /// The login email.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::MagicLink { username } => username,
        }
    }
}

/// Where a successful login left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens and profile are loaded.
    Authenticated,
    /// A one-time claim is held until the emailed link is redeemed.
    MagicLinkSent,
    /// The account has two-factor enabled; a TOTP code is needed next.
    TotpRequired,
}

/// Result of [`SessionLifecycle::ensure_fresh`](super::SessionLifecycle::ensure_fresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The access token had not expired; nothing was sent.
    Valid,
    /// A new pair was obtained.
    Refreshed,
    /// The session could not be renewed and is now anonymous.
    SessionEnded,
}

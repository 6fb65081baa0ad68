//! Session snapshot

use serde::{Deserialize, Serialize};

use crate::auth::TokenPair;
use crate::user::UserProfile;

/// Point-in-time view of the session: tokens plus the loaded profile.
///
/// This is also the shape written to the persisted session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionState {
    /// Current tokens.
    #[serde(default)]
    pub tokens: TokenPair,
    /// Loaded profile, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl SessionState {
    /// Logged in means a profile id and all three token fields are present.
    ///
    /// Expiry is not consulted: an expired but present token still counts
    /// until a refresh attempt fails.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.profile.as_ref().is_some_and(UserProfile::is_loaded) && self.tokens.is_authenticated()
    }

    /// Logged in, superuser and active.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_logged_in()
            && self
                .profile
                .as_ref()
                .is_some_and(|p| p.is_superuser && p.is_active)
    }

    /// Returns true when nothing is held.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.tokens.is_anonymous() && self.profile.is_none()
    }
}

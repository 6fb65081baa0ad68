//! Unverified JWT payload decoding
//!
//! The client never checks signatures; the backend does that on every
//! request. Decoding only reads the payload segment to learn when a token
//! expires and which login attempt it belongs to.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims read from a token payload.
///
/// An undecodable token yields `Claims::default()`, so callers must treat
/// missing `exp` or `fingerprint` as "invalid".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Claims {
    /// Expiry as seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Subject (user id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Correlates tokens issued for the same login attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Set on the intermediate token that still needs a TOTP code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp: Option<bool>,
    /// Everything else in the payload.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Claims {
    /// Decodes the payload segment of a `header.payload.signature` token.
    ///
    /// Never fails: anything that is not a three-part token with a base64url
    /// JSON object in the middle decodes to empty claims.
    #[must_use]
    pub fn decode(token: &str) -> Self {
        Self::try_decode(token).unwrap_or_default()
    }

    fn try_decode(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let Value::Object(mut fields) = serde_json::from_slice(&bytes).ok()? else {
            return None;
        };

        // Each known claim is read on its own so one odd type does not
        // discard the rest.
        let exp = fields.remove("exp").as_ref().and_then(read_exp);
        let sub = fields.remove("sub").and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let fingerprint = fields.remove("fingerprint").and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        });
        let totp = fields.remove("totp").as_ref().and_then(Value::as_bool);

        Some(Self {
            exp,
            sub,
            fingerprint,
            totp,
            extra: fields.into_iter().collect(),
        })
    }

    /// Returns true when nothing could be read from the token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Expiry as a timestamp, if the claim is present and in range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Fail-closed expiry check: a missing `exp` counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| expires_at <= now)
    }

    /// Seconds left before expiry, or `None` when already expired or unknown.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.expires_at()? - now).num_seconds();
        (remaining > 0).then_some(remaining)
    }

    /// Returns true for the intermediate TOTP token.
    #[must_use]
    pub fn is_totp(&self) -> bool {
        self.totp == Some(true)
    }
}

/// Integer seconds, or a float truncated toward the past.
#[allow(clippy::cast_possible_truncation)]
fn read_exp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|secs| secs.is_finite() && secs.abs() < 1e15)
            .map(|secs| secs.floor() as i64)
    })
}

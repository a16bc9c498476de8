//! Decoded token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simgate_core::types::UserId;

/// Claims carried in the middle segment of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPayload {
    /// Subject: the user id.
    pub subject_id: String,
    /// Login name.
    pub username: String,
    /// Role names.
    pub roles: Vec<String>,
    /// Directly granted permissions.
    pub permissions: Vec<String>,
    /// Issued-at, epoch seconds.
    pub issued_at: i64,
    /// Expiry, epoch seconds.
    pub expires_at: i64,
}

/// Wire shape of the claims; only `exp` is mandatory.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    sub: UserId,
    #[serde(default)]
    username: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

impl TokenPayload {
    /// Validate raw claims. `None` when `exp <= iat`.
    pub(crate) fn from_raw(raw: RawClaims) -> Option<Self> {
        if raw.exp <= raw.iat {
            return None;
        }
        Some(Self {
            subject_id: raw.sub.0,
            username: raw.username,
            roles: raw.roles,
            permissions: raw.permissions,
            issued_at: raw.iat,
            expires_at: raw.exp,
        })
    }

    /// Issued-at as a timestamp.
    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.issued_at, 0)
    }

    /// Expiry as a timestamp.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Expiry in epoch milliseconds.
    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at.saturating_mul(1000)
    }
}

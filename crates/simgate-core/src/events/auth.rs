//! Authentication lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Something the rest of the application should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthEvent {
    /// A login succeeded and the session was populated.
    LoggedIn {
        /// The authenticated user.
        user_id: UserId,
        /// Login name.
        username: String,
    },
    /// The session was cleared by an explicit logout.
    LoggedOut,
    /// A token pair was renewed.
    TokenRefreshed {
        /// New access token expiry.
        expires_at: DateTime<Utc>,
    },
    /// Renewal failed and the session was cleared; the user must log in again.
    TokenExpired,
    /// A scheduled renewal failed.
    TokenRefreshFailed {
        /// Failure description.
        reason: String,
    },
    /// Too many failed attempts; logins are blocked until `until`.
    LockedOut {
        /// End of the lockout window.
        until: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoggedIn { .. } => "logged_in",
            Self::LoggedOut => "logged_out",
            Self::TokenRefreshed { .. } => "token_refreshed",
            Self::TokenExpired => "token_expired",
            Self::TokenRefreshFailed { .. } => "token_refresh_failed",
            Self::LockedOut { .. } => "locked_out",
        }
    }
}

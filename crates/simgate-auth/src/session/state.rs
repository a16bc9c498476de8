//! Snapshot and change types of the observable session state.

use std::fmt;

use serde::Serialize;

use simgate_core::types::UserRecord;

/// Everything the UI needs to know about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Whether a login or restore populated the session.
    pub is_authenticated: bool,
    /// The signed-in user.
    pub user: Option<UserRecord>,
    /// Access token.
    #[serde(skip)]
    pub token: Option<String>,
    /// Refresh token.
    #[serde(skip)]
    pub refresh_token: Option<String>,
    /// Access token expiry, epoch milliseconds.
    pub token_expiry: Option<i64>,
    /// Consecutive failed logins.
    pub login_attempts: u32,
    /// End of the current lockout, epoch milliseconds.
    pub lockout_until: Option<i64>,
}

/// Individually observable fields of [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    /// `auth.isAuthenticated`
    IsAuthenticated,
    /// `auth.user`
    User,
    /// `auth.token`
    Token,
    /// `auth.refreshToken`
    RefreshToken,
    /// `auth.tokenExpiry`
    TokenExpiry,
    /// `auth.loginAttempts`
    LoginAttempts,
    /// `auth.lockoutUntil`
    LockoutUntil,
}

impl fmt::Display for SessionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::IsAuthenticated => "auth.isAuthenticated",
            Self::User => "auth.user",
            Self::Token => "auth.token",
            Self::RefreshToken => "auth.refreshToken",
            Self::TokenExpiry => "auth.tokenExpiry",
            Self::LoginAttempts => "auth.loginAttempts",
            Self::LockoutUntil => "auth.lockoutUntil",
        };
        f.write_str(key)
    }
}

/// The value of one field before or after a change.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionValue {
    /// Authentication flag.
    Flag(bool),
    /// User record.
    User(Option<Box<UserRecord>>),
    /// Access or refresh token.
    Secret(Option<String>),
    /// Epoch milliseconds.
    Millis(Option<i64>),
    /// Counter.
    Count(u32),
}

impl fmt::Debug for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(v) => write!(f, "Flag({v})"),
            Self::User(v) => write!(f, "User({:?})", v.as_ref().map(|u| &u.username)),
            Self::Secret(v) => write!(f, "Secret({})", if v.is_some() { "***" } else { "None" }),
            Self::Millis(v) => write!(f, "Millis({v:?})"),
            Self::Count(v) => write!(f, "Count({v})"),
        }
    }
}

impl SessionValue {
    /// The flag, when this is a [`SessionValue::Flag`].
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            _ => None,
        }
    }

    /// The counter, when this is a [`SessionValue::Count`].
    pub fn as_count(&self) -> Option<u32> {
        match self {
            Self::Count(v) => Some(*v),
            _ => None,
        }
    }

    /// The user, when this is a populated [`SessionValue::User`].
    pub fn as_user(&self) -> Option<&UserRecord> {
        match self {
            Self::User(v) => v.as_deref(),
            _ => None,
        }
    }
}

/// Delivered to listeners after every setter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    /// Which field was set.
    pub field: SessionField,
    /// Value after the set.
    pub new: SessionValue,
    /// Value before the set.
    pub old: SessionValue,
}

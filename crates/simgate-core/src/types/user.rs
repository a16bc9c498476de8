//! The authenticated user's record as delivered by the login endpoint.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a user account.
///
/// The backend emits numeric ids while tokens carry them as strings in
/// `sub`; both forms deserialize into the same textual identifier so the
/// two can be compared for ownership checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number for user id, got {other}"
            ))),
        }
    }
}

/// The current user's identity, roles and direct permission overrides.
///
/// Owned by the session store and replaced wholesale on login or refresh;
/// the only partial mutation is an explicit [`ProfileUpdate`] merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Exact role names, e.g. `TEACHER`.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permissions granted directly, bypassing role resolution.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserRecord {
    /// Create a user with no email and no direct permissions.
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            roles,
            permissions: Vec::new(),
        }
    }

    /// Builder-style helper to attach direct permissions.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Apply the fields present in `update`, leaving the rest untouched.
    pub fn merge(&mut self, update: ProfileUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
    }
}

/// A partial profile edit. Roles and permissions cannot be changed this way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New login name.
    pub username: Option<String>,
    /// New contact address.
    pub email: Option<String>,
}

//! Storage key builders for every persisted credential.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the engine writes.

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "sim";

/// Key names under a configurable prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    /// Build keys under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Access token.
    pub fn auth_token(&self) -> String {
        format!("{}_auth_token", self.prefix)
    }

    /// Refresh token.
    pub fn refresh_token(&self) -> String {
        format!("{}_refresh_token", self.prefix)
    }

    /// JSON-serialized user record.
    pub fn current_user(&self) -> String {
        format!("{}_current_user", self.prefix)
    }

    /// Failed login counter.
    pub fn login_attempts(&self) -> String {
        format!("{}_login_attempts", self.prefix)
    }

    /// Lockout end, epoch milliseconds.
    pub fn lockout_until(&self) -> String {
        format!("{}_lockout_until", self.prefix)
    }

    /// The three credential keys cleared on logout.
    pub fn credentials(&self) -> [String; 3] {
        [self.auth_token(), self.refresh_token(), self.current_user()]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

//! Token lifecycle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token expiry and renewal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Safety margin applied by `is_expired` checks, in seconds.
    #[serde(default = "default_expiry_buffer")]
    pub expiry_buffer_seconds: i64,
    /// How long before expiry the refresh timer fires, in minutes.
    #[serde(default = "default_refresh_lead")]
    pub refresh_lead_minutes: u64,
    /// How long a completed refresh is reused by late callers, in seconds.
    /// `0` disables the cooldown.
    #[serde(default = "default_refresh_cooldown")]
    pub refresh_cooldown_seconds: u64,
    /// Window used by the "expiring soon" session indicator, in minutes.
    #[serde(default = "default_expiring_soon")]
    pub expiring_soon_minutes: i64,
}

impl AuthConfig {
    /// Refresh lead time as a [`Duration`].
    pub fn refresh_lead(&self) -> Duration {
        Duration::from_secs(self.refresh_lead_minutes * 60)
    }

    /// Refresh cooldown as a [`Duration`].
    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh_cooldown_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            expiry_buffer_seconds: default_expiry_buffer(),
            refresh_lead_minutes: default_refresh_lead(),
            refresh_cooldown_seconds: default_refresh_cooldown(),
            expiring_soon_minutes: default_expiring_soon(),
        }
    }
}

fn default_expiry_buffer() -> i64 {
    30
}

fn default_refresh_lead() -> u64 {
    5
}

fn default_refresh_cooldown() -> u64 {
    2
}

fn default_expiring_soon() -> i64 {
    5
}

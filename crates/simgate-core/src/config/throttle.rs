//! Failed-login throttling configuration.

use serde::{Deserialize, Serialize};

/// Lockout policy for repeated credential rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum failed login attempts before lockout.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_minutes: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lockout_minutes: default_lockout(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout() -> i64 {
    15
}

//! Consecutive-failure counter with a timed lockout.
//!
//! One throttle exists per client session, not per account. Counters are
//! mirrored into the persistent store so a restart does not reset them.
//! Lockout expiry is lazy: nothing fires when the window ends, the next
//! query notices and clears the stale record.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use simgate_core::config::ThrottleConfig;
use simgate_core::traits::{Clock, KeyValueStore};
use simgate_store::KvManager;

use crate::session::SessionStore;

/// Outcome of recording a failure, or the current throttle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleState {
    /// Logins are allowed.
    Open {
        /// Failures recorded so far.
        attempts: u32,
        /// Failures left before the lockout.
        remaining_attempts: u32,
    },
    /// Logins are blocked.
    Locked {
        /// End of the lockout.
        until: DateTime<Utc>,
        /// Whole minutes left, rounded up.
        remaining_minutes: u32,
    },
}

impl ThrottleState {
    /// Whether this is [`ThrottleState::Locked`].
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Tracks failed logins and decides when to lock.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    kv: KvManager,
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    config: ThrottleConfig,
}

impl LoginThrottle {
    /// Create a throttle and restore persisted counters into `store`.
    ///
    /// A lockout that ended while the process was down is cleared.
    pub fn new(
        kv: KvManager,
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        config: ThrottleConfig,
    ) -> Self {
        let throttle = Self {
            kv,
            store,
            clock,
            config,
        };
        throttle.restore();
        throttle
    }

    fn restore(&self) {
        let keys = self.kv.keys();
        let attempts = self
            .read(&keys.login_attempts())
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(0);
        let lockout = self
            .read(&keys.lockout_until())
            .and_then(|raw| raw.parse::<i64>().ok());

        match lockout {
            Some(until) if until <= self.clock.now_millis() => {
                info!("Stored lockout has expired, clearing");
                self.reset();
            }
            _ => {
                self.store.set_login_attempts(attempts);
                self.store.set_lockout_until(lockout);
            }
        }
    }

    /// Count one rejected credential submission.
    ///
    /// Reaching the configured maximum starts the lockout. While locked,
    /// further calls do not extend it.
    pub fn record_failure(&self) -> ThrottleState {
        if self.is_locked() {
            return self.state();
        }

        let attempts = self.store.login_attempts().saturating_add(1);
        self.store.set_login_attempts(attempts);
        self.write(&self.kv.keys().login_attempts(), &attempts.to_string());

        if attempts >= self.config.max_attempts {
            let until = self.clock.now() + Duration::minutes(self.config.lockout_minutes);
            let until_ms = until.timestamp_millis();
            self.store.set_lockout_until(Some(until_ms));
            self.write(&self.kv.keys().lockout_until(), &until_ms.to_string());
            warn!(attempts, until = %until, "Too many failed logins, locking");
        }

        self.state()
    }

    /// Reset counters after a successful login.
    pub fn record_success(&self) {
        self.reset();
    }

    /// Whether logins are currently blocked. Clears an expired lockout.
    pub fn is_locked(&self) -> bool {
        match self.store.lockout_until() {
            Some(until) if self.clock.now_millis() < until => true,
            Some(_) => {
                info!("Lockout window has passed, clearing");
                self.reset();
                false
            }
            None => false,
        }
    }

    /// Minutes left in the lockout, rounded up; zero when not locked.
    pub fn remaining_lockout_minutes(&self) -> u32 {
        if !self.is_locked() {
            return 0;
        }
        let Some(until) = self.store.lockout_until() else {
            return 0;
        };
        let remaining_ms = until - self.clock.now_millis();
        u32::try_from((remaining_ms + 59_999) / 60_000).unwrap_or(u32::MAX)
    }

    /// Failures recorded so far.
    pub fn attempts(&self) -> u32 {
        self.store.login_attempts()
    }

    /// Current position of the throttle.
    pub fn state(&self) -> ThrottleState {
        if self.is_locked() {
            let until = self
                .store
                .lockout_until()
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or_else(|| self.clock.now());
            return ThrottleState::Locked {
                until,
                remaining_minutes: self.remaining_lockout_minutes(),
            };
        }
        let attempts = self.attempts();
        ThrottleState::Open {
            attempts,
            remaining_attempts: self.config.max_attempts.saturating_sub(attempts),
        }
    }

    /// Configured maximum.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    fn reset(&self) {
        self.store.set_login_attempts(0);
        self.store.set_lockout_until(None);
        let keys = self.kv.keys();
        for key in [keys.login_attempts(), keys.lockout_until()] {
            if let Err(e) = self.kv.remove(&key) {
                warn!(key = %key, error = %e, "Failed to clear throttle record");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.kv.get(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read throttle record");
            None
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.kv.set(key, value) {
            warn!(key, error = %e, "Failed to persist throttle record");
        }
    }
}

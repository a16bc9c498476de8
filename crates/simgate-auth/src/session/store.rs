//! Observable in-memory session state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, error};

use simgate_core::traits::{Clock, SystemClock};
use simgate_core::types::UserRecord;

use super::state::{SessionChange, SessionField, SessionState, SessionValue};

/// Callback invoked synchronously on every change of its field.
pub type Listener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Buffer for async change receivers.
const CHANGE_CAPACITY: usize = 128;

struct Registration {
    id: u64,
    field: SessionField,
    listener: Listener,
}

type Registry = Mutex<Vec<Registration>>;

/// Typed container for the live session, with per-field subscriptions.
///
/// Every setter replaces one field and then notifies that field's
/// listeners in registration order before returning. Listeners run with
/// no lock held, so they may read or write the store. A panicking
/// listener is logged and skipped. Async consumers can follow the same
/// stream through [`SessionStore::changes`].
pub struct SessionStore {
    state: RwLock<SessionState>,
    listeners: Arc<Registry>,
    next_id: AtomicU64,
    changes: broadcast::Sender<SessionChange>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Stop receiving notifications. Safe to call after the store is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().retain(|r| r.id != self.id);
        }
    }
}

impl SessionStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store reading expiry against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: RwLock::new(SessionState::default()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            changes,
            clock,
        }
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Register `listener` for changes to `field`.
    pub fn subscribe(
        &self,
        field: SessionField,
        listener: impl Fn(&SessionChange) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push(Registration {
            id,
            field,
            listener: Arc::new(listener),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Receiver of every change, for async consumers.
    pub fn changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    // ── Getters ────────────────────────────────────────────

    /// Authenticated with a token that has not yet expired.
    ///
    /// Expiry is checked here, at read time; the stored flag is not
    /// flipped when the token lapses.
    pub fn is_authenticated(&self) -> bool {
        let state = self.state.read();
        state.is_authenticated
            && state.token.is_some()
            && state
                .token_expiry
                .is_none_or(|expiry| expiry > self.clock.now_millis())
    }

    /// The signed-in user.
    pub fn user(&self) -> Option<UserRecord> {
        self.state.read().user.clone()
    }

    /// Access token.
    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    /// Refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    /// Access token expiry, epoch milliseconds.
    pub fn token_expiry(&self) -> Option<i64> {
        self.state.read().token_expiry
    }

    /// Consecutive failed logins.
    pub fn login_attempts(&self) -> u32 {
        self.state.read().login_attempts
    }

    /// Lockout end, epoch milliseconds.
    pub fn lockout_until(&self) -> Option<i64> {
        self.state.read().lockout_until
    }

    // ── Setters ────────────────────────────────────────────

    /// Set `auth.isAuthenticated`.
    pub fn set_authenticated(&self, value: bool) {
        let old = std::mem::replace(&mut self.state.write().is_authenticated, value);
        self.notify(
            SessionField::IsAuthenticated,
            SessionValue::Flag(value),
            SessionValue::Flag(old),
        );
    }

    /// Set `auth.user`.
    pub fn set_user(&self, value: Option<UserRecord>) {
        let old = std::mem::replace(&mut self.state.write().user, value.clone());
        self.notify(
            SessionField::User,
            SessionValue::User(value.map(Box::new)),
            SessionValue::User(old.map(Box::new)),
        );
    }

    /// Set `auth.token`.
    pub fn set_token(&self, value: Option<String>) {
        let old = std::mem::replace(&mut self.state.write().token, value.clone());
        self.notify(
            SessionField::Token,
            SessionValue::Secret(value),
            SessionValue::Secret(old),
        );
    }

    /// Set `auth.refreshToken`.
    pub fn set_refresh_token(&self, value: Option<String>) {
        let old = std::mem::replace(&mut self.state.write().refresh_token, value.clone());
        self.notify(
            SessionField::RefreshToken,
            SessionValue::Secret(value),
            SessionValue::Secret(old),
        );
    }

    /// Set `auth.tokenExpiry`.
    pub fn set_token_expiry(&self, value: Option<i64>) {
        let old = std::mem::replace(&mut self.state.write().token_expiry, value);
        self.notify(
            SessionField::TokenExpiry,
            SessionValue::Millis(value),
            SessionValue::Millis(old),
        );
    }

    /// Set `auth.loginAttempts`.
    pub fn set_login_attempts(&self, value: u32) {
        let old = std::mem::replace(&mut self.state.write().login_attempts, value);
        self.notify(
            SessionField::LoginAttempts,
            SessionValue::Count(value),
            SessionValue::Count(old),
        );
    }

    /// Set `auth.lockoutUntil`.
    pub fn set_lockout_until(&self, value: Option<i64>) {
        let old = std::mem::replace(&mut self.state.write().lockout_until, value);
        self.notify(
            SessionField::LockoutUntil,
            SessionValue::Millis(value),
            SessionValue::Millis(old),
        );
    }

    /// Drop the credentials and user, one field at a time.
    ///
    /// Throttle counters are left alone. Listeners may observe the
    /// intermediate, partially cleared state.
    pub fn clear(&self) {
        self.set_authenticated(false);
        self.set_user(None);
        self.set_token(None);
        self.set_refresh_token(None);
        self.set_token_expiry(None);
    }

    fn notify(&self, field: SessionField, new: SessionValue, old: SessionValue) {
        let change = SessionChange { field, new, old };
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|r| r.field == field)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        debug!(field = %field, listeners = targets.len(), "Session field set");
        for listener in targets {
            if catch_unwind(AssertUnwindSafe(|| listener(&change))).is_err() {
                error!(field = %field, "Session listener panicked");
            }
        }
        let _ = self.changes.send(change);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

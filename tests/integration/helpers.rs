//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use parking_lot::Mutex;

use simgate_auth::rbac::MenuItem;
use simgate_auth::{AuthService, RbacEvaluator, RoleCatalog, RouteGuard, RouteTable, SessionStore};
use simgate_core::config::{AuthConfig, ThrottleConfig};
use simgate_core::error::AppError;
use simgate_core::events::{DomainEvent, EventBus};
use simgate_core::result::AppResult;
use simgate_core::traits::{AuthApi, Clock, KeyValueStore, ManualClock};
use simgate_core::types::{AuthTokens, LoginRequest, LoginResponse, UserRecord};
use simgate_store::memory::MemoryKvStore;
use simgate_store::{KvManager, StorageKeys};

/// Password the mock server accepts.
pub const PASSWORD: &str = "correct-horse";

/// Build an unsigned three-segment token for user `1`.
pub fn make_token(roles: &[&str], iat: i64, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "sub": 1,
        "username": "testuser",
        "roles": roles,
        "iat": iat,
        "exp": exp,
    });
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

/// Scripted auth server.
#[derive(Debug)]
pub struct MockAuthApi {
    clock: Arc<ManualClock>,
    roles: Vec<String>,
    /// Lifetime of issued access tokens, in seconds.
    pub token_ttl: Mutex<i64>,
    /// How long `refresh` takes.
    pub refresh_delay: Mutex<Duration>,
    /// When set, `login` fails with this error regardless of credentials.
    pub login_failure: Mutex<Option<AppError>>,
    /// When set, `refresh` fails with this error.
    pub refresh_failure: Mutex<Option<AppError>>,
    /// When set, `logout` fails with this error.
    pub logout_failure: Mutex<Option<AppError>>,
    /// When set, `login` returns this access token.
    pub login_token: Mutex<Option<String>>,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl MockAuthApi {
    pub fn new(clock: Arc<ManualClock>, roles: &[&str]) -> Self {
        Self {
            clock,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            token_ttl: Mutex::new(3600),
            refresh_delay: Mutex::new(Duration::ZERO),
            login_failure: Mutex::new(None),
            refresh_failure: Mutex::new(None),
            logout_failure: Mutex::new(None),
            login_token: Mutex::new(None),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn user(&self) -> UserRecord {
        UserRecord::new(1u64, "testuser", self.roles.clone())
    }

    fn issue(&self) -> String {
        let now = self.clock.now().timestamp();
        let roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
        make_token(&roles, now, now + *self.token_ttl.lock())
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.login_failure.lock().clone() {
            return Err(err);
        }
        if request.password != PASSWORD {
            return Err(AppError::from_status(401, "Bad credentials"));
        }
        let token = self.login_token.lock().clone().unwrap_or_else(|| self.issue());
        Ok(LoginResponse {
            token,
            refresh_token: "refresh-0".to_string(),
            user: self.user(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.refresh_delay.lock();
        tokio::time::sleep(delay).await;
        if let Some(err) = self.refresh_failure.lock().clone() {
            return Err(err);
        }
        assert!(refresh_token.starts_with("refresh-"));
        Ok(AuthTokens {
            token: self.issue(),
            refresh_token: format!("refresh-{n}"),
        })
    }

    async fn logout(&self, _token: &str) -> AppResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn validate(&self, _token: &str) -> AppResult<bool> {
        Ok(true)
    }

    async fn me(&self, _token: &str) -> AppResult<UserRecord> {
        Ok(self.user())
    }

    async fn request_password_reset(&self, _email: &str) -> AppResult<()> {
        Ok(())
    }

    async fn confirm_password_reset(&self, _token: &str, _new_password: &str) -> AppResult<()> {
        Ok(())
    }

    async fn change_password(&self, _token: &str, current: &str, _new: &str) -> AppResult<()> {
        if current == PASSWORD {
            Ok(())
        } else {
            Err(AppError::from_status(400, "Current password is incorrect"))
        }
    }
}

/// A fully wired engine over in-memory storage and a manual clock.
pub struct TestEngine {
    pub clock: Arc<ManualClock>,
    pub api: Arc<MockAuthApi>,
    pub backing: MemoryKvStore,
    pub store: Arc<SessionStore>,
    pub events: EventBus,
    pub auth: AuthService,
    pub rbac: Arc<RbacEvaluator>,
    pub guard: RouteGuard,
}

impl TestEngine {
    /// Engine whose server signs in a user holding `roles`.
    pub fn new(roles: &[&str]) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let api = Arc::new(MockAuthApi::new(Arc::clone(&clock), roles));
        Self::assemble(clock, api, MemoryKvStore::new())
    }

    /// A fresh engine over the same storage, clock and server, as after a reload.
    pub fn restart(&self) -> Self {
        Self::assemble(
            Arc::clone(&self.clock),
            Arc::clone(&self.api),
            self.backing.clone(),
        )
    }

    fn assemble(clock: Arc<ManualClock>, api: Arc<MockAuthApi>, backing: MemoryKvStore) -> Self {
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let kv = KvManager::from_provider(Arc::new(backing.clone()), StorageKeys::default());
        let store = Arc::new(SessionStore::with_clock(Arc::clone(&dyn_clock)));
        let events = EventBus::default();
        let auth = AuthService::new(
            api.clone(),
            kv,
            Arc::clone(&store),
            dyn_clock,
            events.clone(),
            AuthConfig::default(),
            ThrottleConfig::default(),
        );
        let rbac = Arc::new(RbacEvaluator::new(
            Arc::new(RoleCatalog::standard()),
            Arc::clone(&store),
        ));
        let guard = RouteGuard::new(RouteTable::standard(), Arc::clone(&store), Arc::clone(&rbac));
        Self {
            clock,
            api,
            backing,
            store,
            events,
            auth,
            rbac,
            guard,
        }
    }

    /// Sign in with the accepted password.
    pub async fn login(&self) -> UserRecord {
        self.auth
            .login(LoginRequest::new("testuser", PASSWORD))
            .await
            .expect("login should succeed")
    }

    /// Attempt a sign-in with a rejected password.
    pub async fn login_wrong(&self) -> AppError {
        self.auth
            .login(LoginRequest::new("testuser", "wrong"))
            .await
            .expect_err("login should fail")
    }

    /// Raw stored value under `sim_{name}`.
    pub fn stored(&self, name: &str) -> Option<String> {
        self.backing
            .get(&format!("sim_{name}"))
            .expect("memory store does not fail")
    }
}

/// Drain every event already published.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<DomainEvent>) -> Vec<DomainEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The application menu.
pub fn menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new("Dashboard", "dashboard"),
        MenuItem::new("Students", "students"),
        MenuItem::new("Grades", "grades"),
        MenuItem {
            label: "Administration".to_string(),
            ..MenuItem::default()
        }
        .with_children(vec![
            MenuItem::new("Users", "users"),
            MenuItem::new("Settings", "settings"),
        ]),
        MenuItem::new("My Profile", "profile"),
    ]
}

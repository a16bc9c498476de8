//! Integration tests for failed-login throttling.

mod helpers;

use chrono::Duration;

use helpers::TestEngine;
use simgate_auth::ThrottleState;
use simgate_core::error::{AppError, ErrorKind};
use simgate_core::events::AuthEvent;

#[tokio::test]
async fn test_fifth_failure_locks() {
    let engine = TestEngine::new(&["STUDENT"]);
    let mut rx = engine.events.subscribe();

    for attempt in 1..=4 {
        let err = engine.login_wrong().await;
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
        assert_eq!(engine.auth.throttle().attempts(), attempt);
    }
    assert_eq!(
        engine.auth.throttle().state(),
        ThrottleState::Open {
            attempts: 4,
            remaining_attempts: 1
        }
    );

    let err = engine.login_wrong().await;
    assert_eq!(err.kind, ErrorKind::AccountLocked);
    assert_eq!(
        err.message,
        "Account temporarily locked due to too many failed attempts. Try again in 15 minutes."
    );
    assert!(engine.auth.throttle().is_locked());
    assert!(engine.stored("lockout_until").is_some());

    let events = helpers::drain(&mut rx);
    assert!(matches!(
        events.last().map(|e| &e.payload),
        Some(AuthEvent::LockedOut { .. })
    ));
}

#[tokio::test]
async fn test_locked_login_makes_no_request() {
    let engine = TestEngine::new(&["STUDENT"]);
    for _ in 0..5 {
        engine.login_wrong().await;
    }
    let calls = engine.api.logins();

    engine.clock.advance(Duration::minutes(5));
    let err = engine
        .auth
        .login(simgate_core::types::LoginRequest::new("testuser", helpers::PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::AccountLocked);
    assert!(err.message.contains("Try again in 10 minutes"));
    assert_eq!(engine.api.logins(), calls);
    assert_eq!(engine.auth.throttle().attempts(), 5);
}

#[tokio::test]
async fn test_lockout_expires() {
    let engine = TestEngine::new(&["STUDENT"]);
    for _ in 0..5 {
        engine.login_wrong().await;
    }

    engine.clock.advance(Duration::minutes(15) + Duration::seconds(1));

    assert!(!engine.auth.throttle().is_locked());
    assert_eq!(engine.auth.throttle().attempts(), 0);
    engine.login().await;
    assert!(engine.auth.is_authenticated());
    assert!(engine.stored("lockout_until").is_none());
}

#[tokio::test]
async fn test_success_resets_counter() {
    let engine = TestEngine::new(&["STUDENT"]);
    for _ in 0..3 {
        engine.login_wrong().await;
    }

    engine.login().await;

    assert_eq!(engine.auth.throttle().attempts(), 0);
    assert_eq!(engine.store.login_attempts(), 0);
    assert_ne!(engine.stored("login_attempts").as_deref(), Some("3"));
}

#[tokio::test]
async fn test_lockout_survives_reload() {
    let engine = TestEngine::new(&["STUDENT"]);
    for _ in 0..5 {
        engine.login_wrong().await;
    }

    let reloaded = engine.restart();

    assert!(reloaded.auth.throttle().is_locked());
    assert_eq!(reloaded.store.login_attempts(), 5);
    let err = reloaded.login_wrong().await;
    assert_eq!(err.kind, ErrorKind::AccountLocked);
}

#[tokio::test]
async fn test_expired_lockout_cleared_on_reload() {
    let engine = TestEngine::new(&["STUDENT"]);
    for _ in 0..5 {
        engine.login_wrong().await;
    }

    engine.clock.advance(Duration::minutes(20));
    let reloaded = engine.restart();

    assert!(!reloaded.auth.throttle().is_locked());
    assert_eq!(reloaded.store.login_attempts(), 0);
    assert!(reloaded.store.lockout_until().is_none());
}

#[tokio::test]
async fn test_server_lock_and_rate_limit_do_not_count() {
    let engine = TestEngine::new(&["STUDENT"]);

    *engine.api.login_failure.lock() = Some(AppError::from_status(423, "locked upstream"));
    assert_eq!(engine.login_wrong().await.kind, ErrorKind::AccountLocked);

    *engine.api.login_failure.lock() = Some(AppError::from_status(429, "slow down"));
    assert_eq!(engine.login_wrong().await.kind, ErrorKind::RateLimited);

    assert_eq!(engine.auth.throttle().attempts(), 0);
    assert!(!engine.auth.throttle().is_locked());
}

//! Integration tests for token renewal.

mod helpers;

use std::time::Duration;

use helpers::TestEngine;
use simgate_core::error::{AppError, ErrorKind};
use simgate_core::events::AuthEvent;

#[tokio::test(start_paused = true)]
async fn test_concurrent_refresh_makes_one_request() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    *engine.api.refresh_delay.lock() = Duration::from_millis(500);

    let (a, b, c) = tokio::join!(
        engine.auth.refresh_token(),
        engine.auth.refresh_token(),
        engine.auth.scheduler().refresh_now(),
    );

    assert_eq!(engine.api.refreshes(), 1);
    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(a.refresh_token, "refresh-1");
    assert_eq!(engine.store.token(), Some(a.token.clone()));
    assert_eq!(engine.stored("auth_token"), Some(a.token));
    assert_eq!(engine.stored("refresh_token").as_deref(), Some("refresh-1"));
}

#[tokio::test(start_paused = true)]
async fn test_timer_renews_before_expiry() {
    let engine = TestEngine::new(&["TEACHER"]);
    *engine.api.token_ttl.lock() = 10 * 60;
    engine.login().await;
    let mut rx = engine.events.subscribe();

    tokio::time::sleep(Duration::from_secs(290)).await;
    assert_eq!(engine.api.refreshes(), 0);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(engine.api.refreshes(), 1);
    assert_eq!(engine.store.refresh_token().as_deref(), Some("refresh-1"));
    assert!(engine.auth.is_authenticated());
    assert!(engine.auth.scheduler().is_armed());
    assert!(matches!(
        rx.recv().await.unwrap().payload,
        AuthEvent::TokenRefreshed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_timer_failure_ends_session() {
    let engine = TestEngine::new(&["TEACHER"]);
    *engine.api.token_ttl.lock() = 10 * 60;
    engine.login().await;
    *engine.api.refresh_failure.lock() = Some(AppError::from_status(401, "refresh token revoked"));
    let mut rx = engine.events.subscribe();

    tokio::time::sleep(Duration::from_secs(301)).await;

    assert_eq!(engine.api.refreshes(), 1);
    assert!(!engine.auth.is_authenticated());
    assert!(engine.store.user().is_none());
    assert!(engine.stored("auth_token").is_none());
    assert!(engine.stored("refresh_token").is_none());
    assert!(!engine.auth.scheduler().is_armed());

    let events: Vec<AuthEvent> = helpers::drain(&mut rx)
        .into_iter()
        .map(|e| e.payload)
        .collect();
    assert!(matches!(
        events.as_slice(),
        [AuthEvent::TokenRefreshFailed { .. }, AuthEvent::TokenExpired]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_failure_is_terminal_for_all_callers() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    *engine.api.refresh_delay.lock() = Duration::from_millis(100);
    *engine.api.refresh_failure.lock() = Some(AppError::network("connection reset"));

    let (a, b) = tokio::join!(engine.auth.refresh_token(), engine.auth.refresh_token());

    assert_eq!(engine.api.refreshes(), 1);
    let (a, b) = (a.unwrap_err(), b.unwrap_err());
    assert_eq!(a.kind, ErrorKind::RefreshFailure);
    assert_eq!(b.kind, ErrorKind::RefreshFailure);
    assert!(!engine.auth.is_authenticated());
    assert!(engine.stored("current_user").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_releases_slot() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    *engine.api.refresh_failure.lock() = Some(AppError::timeout("timed out"));

    assert!(engine.auth.refresh_token().await.is_err());
    assert!(!engine.auth.scheduler().is_in_flight());

    *engine.api.refresh_failure.lock() = None;
    engine.login().await;
    engine.auth.refresh_token().await.unwrap();
    assert_eq!(engine.api.refreshes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_logout_during_refresh_discards_result() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    *engine.api.refresh_delay.lock() = Duration::from_secs(1);

    let scheduler = engine.auth.scheduler().clone();
    let pending = tokio::spawn(async move { scheduler.refresh_now().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(engine.auth.scheduler().is_in_flight());

    engine.auth.logout().await;
    let tokens = pending.await.unwrap().unwrap();

    assert_eq!(tokens.refresh_token, "refresh-1");
    assert!(!engine.auth.is_authenticated());
    assert!(engine.store.token().is_none());
    assert!(engine.stored("auth_token").is_none());
    assert!(!engine.auth.scheduler().is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_without_session_fails() {
    let engine = TestEngine::new(&["TEACHER"]);

    let err = engine.auth.refresh_token().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::RefreshFailure);
    assert_eq!(engine.api.refreshes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restored_session_inside_window_renews_at_once() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    engine.auth.scheduler().disarm();

    engine.clock.advance(chrono::Duration::minutes(57));
    let reloaded = engine.restart();
    assert!(reloaded.auth.initialize_from_storage());

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(engine.api.refreshes(), 1);
    assert_eq!(reloaded.store.refresh_token().as_deref(), Some("refresh-1"));
}

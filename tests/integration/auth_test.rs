//! Integration tests for the login, logout and restore lifecycle.

mod helpers;

use chrono::Duration;

use helpers::TestEngine;
use simgate_core::error::{AppError, ErrorKind};
use simgate_core::events::AuthEvent;
use simgate_core::types::{LoginRequest, ProfileUpdate};

#[tokio::test]
async fn test_login_success_populates_and_persists() {
    let engine = TestEngine::new(&["TEACHER"]);
    let mut rx = engine.events.subscribe();

    let user = engine.login().await;

    assert_eq!(user.username, "testuser");
    assert!(engine.auth.is_authenticated());
    assert!(engine.auth.is_session_valid());
    assert_eq!(engine.store.user(), Some(user));
    assert_eq!(engine.store.refresh_token().as_deref(), Some("refresh-0"));
    assert!(engine.store.token_expiry().is_some());
    assert_eq!(engine.stored("auth_token"), engine.store.token());
    assert_eq!(engine.stored("refresh_token").as_deref(), Some("refresh-0"));
    assert!(engine.stored("current_user").is_some());
    assert!(engine.auth.scheduler().is_armed());

    let events = helpers::drain(&mut rx);
    assert!(matches!(
        events.last().map(|e| &e.payload),
        Some(AuthEvent::LoggedIn { username, .. }) if username == "testuser"
    ));
}

#[tokio::test]
async fn test_login_invalid_password() {
    let engine = TestEngine::new(&["TEACHER"]);

    let err = engine.login_wrong().await;

    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert_eq!(err.message, "Invalid email/username or password");
    assert_eq!(err.status, Some(401));
    assert!(!engine.auth.is_authenticated());
    assert_eq!(engine.auth.throttle().attempts(), 1);
    assert_eq!(engine.stored("login_attempts").as_deref(), Some("1"));
    assert!(engine.stored("auth_token").is_none());
}

#[tokio::test]
async fn test_server_failure_does_not_count_as_attempt() {
    let engine = TestEngine::new(&["TEACHER"]);
    *engine.api.login_failure.lock() = Some(AppError::from_status(503, "maintenance"));

    let err = engine
        .auth
        .login(LoginRequest::new("testuser", helpers::PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(engine.auth.throttle().attempts(), 0);

    *engine.api.login_failure.lock() = Some(AppError::network("connection reset"));
    let err = engine.login_wrong().await;
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(engine.auth.throttle().attempts(), 0);
}

#[tokio::test]
async fn test_empty_credentials_rejected_before_request() {
    let engine = TestEngine::new(&["TEACHER"]);

    let err = engine
        .auth
        .login(LoginRequest::new("", ""))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(engine.api.logins(), 0);
    assert_eq!(engine.auth.throttle().attempts(), 0);
}

#[tokio::test]
async fn test_undecodable_server_token() {
    let engine = TestEngine::new(&["TEACHER"]);
    *engine.api.login_token.lock() = Some("not-a-token".to_string());

    let err = engine
        .auth
        .login(LoginRequest::new("testuser", helpers::PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedToken);
    assert!(!engine.auth.is_authenticated());
    assert!(engine.stored("auth_token").is_none());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    let mut rx = engine.events.subscribe();

    engine.auth.logout().await;

    assert_eq!(engine.api.logouts(), 1);
    assert!(!engine.auth.is_authenticated());
    assert!(engine.store.user().is_none());
    assert!(engine.store.token().is_none());
    assert!(engine.store.refresh_token().is_none());
    assert!(engine.stored("auth_token").is_none());
    assert!(engine.stored("refresh_token").is_none());
    assert!(engine.stored("current_user").is_none());
    assert!(!engine.auth.scheduler().is_armed());
    assert!(engine.auth.auth_header().is_none());
    assert_eq!(rx.recv().await.unwrap().payload, AuthEvent::LoggedOut);
}

#[tokio::test]
async fn test_logout_survives_server_error() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    *engine.api.logout_failure.lock() = Some(AppError::network("offline"));

    engine.auth.logout().await;

    assert!(!engine.auth.is_authenticated());
    assert!(engine.stored("auth_token").is_none());
}

#[tokio::test]
async fn test_restore_after_reload() {
    let engine = TestEngine::new(&["STAFF"]);
    let user = engine.login().await;

    let reloaded = engine.restart();
    assert!(!reloaded.auth.is_authenticated());

    assert!(reloaded.auth.initialize_from_storage());
    assert!(reloaded.auth.is_authenticated());
    assert_eq!(reloaded.store.user(), Some(user));
    assert_eq!(reloaded.store.token(), engine.store.token());
    assert_eq!(reloaded.store.refresh_token().as_deref(), Some("refresh-0"));
    assert!(reloaded.auth.scheduler().is_armed());
}

#[tokio::test]
async fn test_restore_discards_expired_session() {
    let engine = TestEngine::new(&["STAFF"]);
    engine.login().await;
    engine.auth.scheduler().disarm();

    engine.clock.advance(Duration::hours(2));
    let reloaded = engine.restart();

    assert!(!reloaded.auth.initialize_from_storage());
    assert!(!reloaded.auth.is_authenticated());
    assert!(reloaded.stored("auth_token").is_none());
    assert!(reloaded.stored("current_user").is_none());
}

#[tokio::test]
async fn test_restore_with_nothing_stored() {
    let engine = TestEngine::new(&["STAFF"]);
    assert!(!engine.auth.initialize_from_storage());
    assert!(!engine.auth.scheduler().is_armed());
}

#[tokio::test]
async fn test_session_goes_invalid_when_token_expires() {
    let engine = TestEngine::new(&["STAFF"]);
    engine.login().await;
    engine.auth.scheduler().disarm();

    engine.clock.advance(Duration::minutes(59) + Duration::seconds(45));

    assert!(!engine.auth.is_session_valid());
    engine.clock.advance(Duration::seconds(30));
    assert!(!engine.auth.is_authenticated());
}

#[tokio::test]
async fn test_session_info_and_header() {
    let engine = TestEngine::new(&["STAFF"]);
    engine.login().await;

    let info = engine.auth.session_info().unwrap();
    assert!(info.time_until_expiry.as_secs() > 3500);
    assert!(!info.is_expiring_soon);
    assert_eq!(info.user.unwrap().username, "testuser");

    let (name, value) = engine.auth.auth_header().unwrap();
    assert_eq!(name, "Authorization");
    assert_eq!(value, format!("Bearer {}", engine.store.token().unwrap()));

    engine.auth.scheduler().disarm();
    engine.clock.advance(Duration::minutes(57));
    assert!(engine.auth.session_info().unwrap().is_expiring_soon);
}

#[tokio::test]
async fn test_profile_update_persists() {
    let engine = TestEngine::new(&["STAFF"]);
    engine.login().await;

    let updated = engine
        .auth
        .update_profile(ProfileUpdate {
            username: None,
            email: Some("staff@school.example".to_string()),
        })
        .unwrap();

    assert_eq!(updated.email.as_deref(), Some("staff@school.example"));
    assert_eq!(updated.username, "testuser");
    let reloaded = engine.restart();
    assert!(reloaded.auth.initialize_from_storage());
    assert_eq!(
        reloaded.store.user().unwrap().email.as_deref(),
        Some("staff@school.example")
    );
}

#[tokio::test]
async fn test_password_flows_validate_input() {
    let engine = TestEngine::new(&["STAFF"]);

    let err = engine
        .auth
        .request_password_reset("not-an-email")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    engine
        .auth
        .request_password_reset("staff@school.example")
        .await
        .unwrap();

    let err = engine.auth.change_password(helpers::PASSWORD, "longenough").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    engine.login().await;
    let err = engine.auth.change_password(helpers::PASSWORD, "short").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    engine
        .auth
        .change_password(helpers::PASSWORD, "longenough")
        .await
        .unwrap();
}

//! Integration tests for role-based access and route guarding.

mod helpers;

use chrono::Duration;

use helpers::TestEngine;
use simgate_auth::{GuardDecision, Requirement};

fn labels(items: &[simgate_auth::rbac::MenuItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let engine = TestEngine::new(&["TEACHER"]);

    assert_eq!(
        engine.guard.decide("#/grades?term=2"),
        GuardDecision::RedirectToLogin {
            return_to: "#/grades?term=2".to_string()
        }
    );
    assert_eq!(engine.guard.decide("login"), GuardDecision::Proceed);
    assert_eq!(engine.guard.decide("help"), GuardDecision::Proceed);
    assert_eq!(engine.rbac.role_display_name(), "Guest");
    assert!(!engine.rbac.has_permission("VIEW_DASHBOARD"));
}

#[tokio::test]
async fn test_teacher_access() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;

    assert!(engine.guard.can_access("students"));
    assert!(engine.guard.can_access("/students/12"));
    assert!(engine.guard.can_access("#/grades?term=2"));
    assert!(engine.guard.can_access("reports"));
    assert_eq!(
        engine.guard.decide("users"),
        GuardDecision::AccessDenied {
            required: Requirement::Permissions(vec![
                "VIEW_USERS".to_string(),
                "MANAGE_USERS".to_string()
            ])
        }
    );
    assert!(matches!(
        engine.guard.decide("settings"),
        GuardDecision::AccessDenied {
            required: Requirement::Roles(_)
        }
    ));

    assert_eq!(engine.rbac.role_display_name(), "Teacher");
    assert!(engine.rbac.has_permission("VIEW_BASIC_REPORTS"));
    assert!(engine.rbac.can_perform_action("edit", "grade", None));
    assert!(!engine.rbac.can_perform_action("delete", "student", None));
}

#[tokio::test]
async fn test_admin_access() {
    let engine = TestEngine::new(&["ADMIN"]);
    engine.login().await;

    assert!(engine.guard.can_access("users"));
    assert!(engine.guard.can_access("settings"));
    assert!(engine.rbac.can_perform_action("delete", "user", None));
    assert!(!engine.rbac.has_permission("VIEW_OWN_GRADES"));
}

#[tokio::test]
async fn test_super_admin_access() {
    let engine = TestEngine::new(&["SUPER_ADMIN"]);
    engine.login().await;

    for route in engine.guard.routes().names() {
        assert!(engine.guard.can_access(route), "{route}");
    }
    assert!(engine.rbac.has_all_permissions(&["MANAGE_SYSTEM_SETTINGS", "VIEW_OWN_GRADES"]));
    assert!(!engine.rbac.can_perform_action("archive", "grade", None));
    assert_eq!(engine.rbac.role_display_name(), "Super Administrator");
}

#[tokio::test]
async fn test_student_own_resources() {
    let engine = TestEngine::new(&["STUDENT"]);
    engine.login().await;

    assert!(engine.guard.can_access("profile"));
    assert!(!engine.guard.can_access("dashboard"));
    assert!(engine.rbac.can_perform_action("view", "grade", Some("1")));
    assert!(!engine.rbac.can_perform_action("view", "grade", Some("2")));
    assert!(!engine.rbac.can_perform_action("view", "grade", None));
}

#[tokio::test]
async fn test_menu_follows_access() {
    let engine = TestEngine::new(&["TEACHER"]);

    let anonymous = engine.guard.filter_menu(&helpers::menu());
    assert_eq!(labels(&anonymous), vec!["Administration"]);
    assert!(anonymous[0].children.is_empty());

    engine.login().await;
    let teacher = engine.guard.filter_menu(&helpers::menu());
    assert_eq!(
        labels(&teacher),
        vec!["Dashboard", "Students", "Grades", "Administration", "My Profile"]
    );
    assert!(teacher[3].children.is_empty());
}

#[tokio::test]
async fn test_admin_menu_keeps_children() {
    let engine = TestEngine::new(&["ADMIN"]);
    engine.login().await;

    let menu = engine.guard.filter_menu(&helpers::menu());
    let admin = menu.iter().find(|i| i.label == "Administration").unwrap();
    assert_eq!(labels(&admin.children), vec!["Users", "Settings"]);
}

#[tokio::test]
async fn test_access_ends_with_session() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    assert!(engine.guard.can_access("grades"));

    engine.auth.logout().await;

    assert!(matches!(
        engine.guard.decide("grades"),
        GuardDecision::RedirectToLogin { .. }
    ));
    assert!(engine.rbac.effective_permissions().is_empty());
}

#[tokio::test]
async fn test_expired_token_redirects() {
    let engine = TestEngine::new(&["TEACHER"]);
    engine.login().await;
    engine.auth.scheduler().disarm();

    engine.clock.advance(Duration::hours(1) + Duration::seconds(1));

    assert!(matches!(
        engine.guard.decide("grades"),
        GuardDecision::RedirectToLogin { .. }
    ));
}

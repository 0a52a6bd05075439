//! Login, registration and logout driven through the router.

use axum::http::{header, StatusCode};
use backend_lib::config::{LockoutSettings, Settings};

use crate::test_utils::{assert_redirect, body_text, session_cookie, TestApp};

#[tokio::test]
async fn test_register_then_login_flow() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;

    let response = app.login("alice", "secret123", None).await;
    assert_redirect(&response, "/student-log");
    let cookie = session_cookie(&response).unwrap();

    let page = app.get("/student-log", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = body_text(page).await;
    assert!(body.contains("The Year of Our Lord"));
    assert!(body.contains("No students found for your parish."));
}

#[tokio::test]
async fn test_wrong_password_flashes_generic_message() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;

    let response = app.login("alice", "wrongpw", None).await;
    assert_redirect(&response, "/login");
    let cookie = session_cookie(&response).unwrap();

    // The bounced session is still anonymous
    let guarded = app.get("/student-log", Some(&cookie)).await;
    assert_redirect(&guarded, "/login");

    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(body.contains("Incorrect username or password"));

    // Flash messages are shown once
    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(!body.contains("Incorrect username or password"));
}

#[tokio::test]
async fn test_unknown_user_gets_same_message() {
    let app = TestApp::new();

    let response = app.login("bob", "anything", None).await;
    assert_redirect(&response, "/login");
    let cookie = session_cookie(&response).unwrap();

    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(body.contains("Incorrect username or password"));
}

#[tokio::test]
async fn test_login_rotates_session_token() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;

    let bounced = app.login("alice", "wrongpw", None).await;
    let anonymous = session_cookie(&bounced).unwrap();

    let response = app.login("alice", "secret123", Some(&anonymous)).await;
    assert_redirect(&response, "/student-log");
    let authenticated = session_cookie(&response).unwrap();
    assert_ne!(anonymous, authenticated);

    // The pre-login token does not carry the login
    assert_redirect(&app.get("/student-log", Some(&anonymous)).await, "/login");
    assert_eq!(
        app.get("/student-log", Some(&authenticated)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_duplicate_registration_redirects_to_login() {
    let app = TestApp::new();
    app.register("alice", "secret123").await;

    let response = app
        .post_form("/register", &[("username", "alice"), ("password", "another-one")], None)
        .await;
    assert_redirect(&response, "/login");
    let cookie = session_cookie(&response).unwrap();

    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(body.contains("already registered"));
}

#[tokio::test]
async fn test_short_password_rejected_at_registration() {
    let app = TestApp::new();

    let response = app
        .post_form("/register", &[("username", "alice"), ("password", "short")], None)
        .await;
    assert_redirect(&response, "/register");

    let login = app.login("alice", "short", None).await;
    assert_redirect(&login, "/login");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = TestApp::new();
    let cookie = app.register("alice", "secret123").await;
    assert_eq!(app.get("/student-log", Some(&cookie)).await.status(), StatusCode::OK);

    let response = app.get("/logout", Some(&cookie)).await;
    assert_redirect(&response, "/");
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    assert_redirect(&app.get("/student-log", Some(&cookie)).await, "/login");
}

#[tokio::test]
async fn test_logout_form_posts() {
    let app = TestApp::new();
    let cookie = app.register("alice", "secret123").await;

    let page = body_text(app.get("/student-log", Some(&cookie)).await).await;
    assert!(page.contains(r#"<form method="post" action="/logout""#));

    let response = app.post_form("/logout", &[], Some(&cookie)).await;
    assert_redirect(&response, "/");
    assert_redirect(&app.get("/student-log", Some(&cookie)).await, "/login");
}

#[tokio::test]
async fn test_failed_logins_do_not_pile_up_sessions() {
    let settings = Settings {
        max_anonymous_sessions: 20,
        ..Settings::default()
    };
    let app = TestApp::with_settings(settings);
    let alice = app.register("alice", "secret123").await;

    for _ in 0..60 {
        let response = app.login("nobody", "whatever1", None).await;
        assert_redirect(&response, "/login");
    }

    let sessions = app.state.identity.sessions();
    // Twenty anonymous sessions plus alice's
    assert_eq!(sessions.active_count().await, 21);
    assert_eq!(app.get("/student-log", Some(&alice)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reading_flash_drops_anonymous_session() {
    let app = TestApp::new();

    let response = app.login("nobody", "whatever1", None).await;
    let cookie = session_cookie(&response).unwrap();
    assert_eq!(app.state.identity.sessions().active_count().await, 1);

    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(body.contains("Incorrect username or password"));
    assert_eq!(app.state.identity.sessions().active_count().await, 0);
}

#[tokio::test]
async fn test_protected_pages_redirect_when_anonymous() {
    let app = TestApp::new();

    for path in ["/student-log", "/class-list", "/reg-student", "/edit-student/1"] {
        assert_redirect(&app.get(path, None).await, "/login");
    }
    assert_redirect(&app.get("/student-log", Some("parish_session=forged")).await, "/login");
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = TestApp::new();

    for path in ["/", "/login", "/register"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_lockout_when_enabled() {
    let settings = Settings {
        login_lockout: LockoutSettings {
            enabled: true,
            max_attempts: 2,
            lockout_secs: 300,
        },
        ..Settings::default()
    };
    let app = TestApp::with_settings(settings);
    app.register("alice", "secret123").await;

    app.login("alice", "wrongpw", None).await;
    app.login("alice", "wrongpw", None).await;

    let response = app.login("alice", "secret123", None).await;
    assert_redirect(&response, "/login");
    let cookie = session_cookie(&response).unwrap();
    let body = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(body.contains("Too many failed attempts"));
}

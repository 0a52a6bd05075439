//! Student records stay inside the parish that created them.

use axum::http::StatusCode;
use backend_lib::auth::{AuthService, SessionPayload};

use crate::test_utils::{assert_redirect, body_text, TestApp};

async fn add_student(app: &TestApp, cookie: &str, name: &str, extra: &[(&str, &str)]) {
    let mut fields = vec![
        ("child_name", name),
        ("child_surname", "Lopez"),
        ("age", "12"),
        ("birthday", "2013-04-02"),
        ("year", "2025"),
        ("parent_email", "maria@example.org"),
    ];
    fields.extend_from_slice(extra);
    let response = app.post_form("/reg-student", &fields, Some(cookie)).await;
    assert_redirect(&response, "/student-log");
}

async fn student_ids(app: &TestApp, tenant: &str) -> Vec<u64> {
    let principal = app
        .state
        .auth
        .restore(&SessionPayload {
            username: tenant.to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    app.state
        .scope(&principal)
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect()
}

#[tokio::test]
async fn test_listing_shows_only_own_parish() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;
    let carol = app.register("carol", "secret456").await;

    add_student(&app, &alice, "Ana", &[]).await;
    add_student(&app, &carol, "Cleo", &[]).await;

    let body = body_text(app.get("/student-log", Some(&alice)).await).await;
    assert!(body.contains("Ana"));
    assert!(!body.contains("Cleo"));

    let body = body_text(app.get("/class-list", Some(&carol)).await).await;
    assert!(body.contains("Cleo"));
    assert!(!body.contains("Ana"));
}

#[tokio::test]
async fn test_posted_parish_is_ignored() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;
    app.register("carol", "secret456").await;

    add_student(&app, &alice, "Ana", &[("parish_email", "carol")]).await;

    assert_eq!(student_ids(&app, "alice").await.len(), 1);
    assert!(student_ids(&app, "carol").await.is_empty());
}

#[tokio::test]
async fn test_other_parish_records_are_not_found() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;
    let carol = app.register("carol", "secret456").await;
    add_student(&app, &alice, "Ana", &[]).await;
    let id = student_ids(&app, "alice").await[0].to_string();

    let view = app.get(&format!("/edit-student/{id}"), Some(&carol)).await;
    assert_eq!(view.status(), StatusCode::NOT_FOUND);

    let edit = app
        .post_form(
            "/editStudent",
            &[("studentId", id.as_str()), ("name", "Hijacked"), ("surname", "X")],
            Some(&carol),
        )
        .await;
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);

    let delete = app
        .post_form("/deleteStudent", &[("studentId", id.as_str())], Some(&carol))
        .await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    // Untouched for its owner
    let body = body_text(app.get(&format!("/edit-student/{id}"), Some(&alice)).await).await;
    assert!(body.contains("Ana"));
    assert!(!body.contains("Hijacked"));
}

#[tokio::test]
async fn test_owner_can_edit_and_delete() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;
    add_student(&app, &alice, "Ana", &[]).await;
    let id = student_ids(&app, "alice").await[0].to_string();

    let edit = app
        .post_form(
            "/editStudent",
            &[
                ("studentId", id.as_str()),
                ("name", "Anabel"),
                ("surname", "Lopez"),
                ("age", "13"),
            ],
            Some(&alice),
        )
        .await;
    assert_redirect(&edit, "/student-log");
    let body = body_text(app.get("/student-log", Some(&alice)).await).await;
    assert!(body.contains("Anabel"));

    let delete = app
        .post_form("/deleteStudent", &[("studentId", id.as_str())], Some(&alice))
        .await;
    assert_redirect(&delete, "/class-list");
    assert!(student_ids(&app, "alice").await.is_empty());
}

#[tokio::test]
async fn test_missing_name_is_bad_request() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;

    let response = app
        .post_form("/reg-student", &[("child_surname", "Lopez")], Some(&alice))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(student_ids(&app, "alice").await.is_empty());
}

#[tokio::test]
async fn test_malformed_student_id_is_bad_request() {
    let app = TestApp::new();
    let alice = app.register("alice", "secret123").await;

    let response = app.get("/edit-student/not-a-number", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

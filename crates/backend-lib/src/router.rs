// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP routes.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, pages, students};
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route(
            "/reg-student",
            get(students::reg_student_page).post(students::reg_student),
        )
        .route("/student-log", get(students::student_log))
        .route("/class-list", get(students::class_list))
        .route("/edit-student/{id}", get(students::edit_student_page))
        .route("/editStudent", post(students::edit_student))
        .route("/deleteStudent", post(students::delete_student))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

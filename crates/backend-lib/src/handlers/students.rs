// ============================
// crates/backend-lib/src/handlers/students.rs
// ============================
//! Student registry pages.
//!
//! Every handler here takes a [`CurrentUser`] and goes through the
//! principal's [`ParishScope`](crate::scope::ParishScope), so records of
//! other parishes can be neither read nor changed.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form,
};
use parish_common::{DeleteStudentForm, EditStudentForm, StudentForm};
use serde_json::json;

use super::current_year;
use crate::error::AppError;
use crate::extract::CurrentUser;
use crate::validation::{parse_student_id, validate_student_form};
use crate::AppState;

pub const NO_STUDENTS: &str = "No students found for your parish.";

pub async fn reg_student_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(_principal): CurrentUser,
) -> Result<Html<String>, AppError> {
    state.views.render("reg-student", &json!({ "title": "Register a student" }))
}

pub async fn reg_student(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Form(form): Form<StudentForm>,
) -> Result<Redirect, AppError> {
    let details = validate_student_form(&form)?;
    let student = state.scope(&principal).create(details).await?;
    tracing::info!(tenant = %student.tenant_id, id = student.id, "student registered");
    Ok(Redirect::to("/student-log"))
}

pub async fn student_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
) -> Result<Html<String>, AppError> {
    let students = state.scope(&principal).list().await?;
    let title = format!("The Year of Our Lord {}", current_year());

    if students.is_empty() {
        state.views.render(
            "student-log",
            &json!({ "title": title, "student_info": [], "message": NO_STUDENTS }),
        )
    } else {
        state
            .views
            .render("student-log", &json!({ "title": title, "student_info": students }))
    }
}

pub async fn class_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
) -> Result<Html<String>, AppError> {
    let students = state.scope(&principal).list().await?;
    let title = format!("Class List {}", current_year());

    let rows: Vec<_> = students
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.details.name,
                "surname": s.details.surname,
                "age": s.details.age,
                "birthday": s.details.birthday,
                "confirmation_year": s.details.confirmation_year,
            })
        })
        .collect();

    let message = rows.is_empty().then_some(NO_STUDENTS);
    state.views.render(
        "class-list",
        &json!({ "title": title, "student_info": rows, "message": message }),
    )
}

pub async fn edit_student_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_student_id(&id)?;
    let student = state.scope(&principal).get(id).await?;
    let title = format!("Edit {} {}", student.details.name, student.details.surname);
    state
        .views
        .render("edit-student", &json!({ "title": title, "student": student }))
}

pub async fn edit_student(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Form(form): Form<EditStudentForm>,
) -> Result<Redirect, AppError> {
    let id = parse_student_id(&form.student_id)?;
    let details = validate_student_form(&form.student)?;
    state.scope(&principal).update(id, details).await?;
    tracing::info!(tenant = %principal.tenant_id, id, "student updated");
    Ok(Redirect::to("/student-log"))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Form(form): Form<DeleteStudentForm>,
) -> Result<Redirect, AppError> {
    let id = parse_student_id(&form.student_id)?;
    state.scope(&principal).delete(id).await?;
    tracing::info!(tenant = %principal.tenant_id, id, "student deleted");
    Ok(Redirect::to("/class-list"))
}

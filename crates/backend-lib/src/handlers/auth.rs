// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login, registration and logout.
use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use parish_common::CredentialsForm;
use serde_json::json;

use super::redirect_with_cookie;
use crate::auth::{AuthResult, Registration};
use crate::error::AppError;
use crate::extract::SessionToken;
use crate::validation::{validate_login_password, validate_new_password, validate_username};
use crate::AppState;

/// Shown for both unknown users and wrong passwords
pub const LOGIN_REJECTED: &str = "Incorrect username or password";
pub const LOGIN_LOCKED: &str = "Too many failed attempts, please try again later";
pub const ACCOUNT_EXISTS: &str = "That username is already registered, please log in";

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
) -> Result<Html<String>, AppError> {
    let flash = match token.as_deref() {
        Some(token) => state.identity.sessions().take_flash(token).await,
        None => Vec::new(),
    };
    state.views.render("login", &json!({ "title": "Log in", "flash": flash }))
}

pub async fn register_page(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
) -> Result<Html<String>, AppError> {
    let flash = match token.as_deref() {
        Some(token) => state.identity.sessions().take_flash(token).await,
        None => Vec::new(),
    };
    state.views.render("register", &json!({ "title": "Register", "flash": flash }))
}

/// Flash `message` on the client's session and send them to `location`
async fn bounce(
    state: &AppState,
    token: &SessionToken,
    location: &str,
    message: &str,
) -> Result<Response, AppError> {
    let token = state
        .identity
        .sessions()
        .push_flash(token.as_deref(), message)
        .await;
    Ok(redirect_with_cookie(location, state.session_cookie(&token)?))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(e) = validate_username(&form.username).and(validate_login_password(&form.password)) {
        return bounce(&state, &token, "/login", &e.to_string()).await;
    }

    match state.auth.authenticate(&form.username, &form.password).await {
        Ok(AuthResult::Accepted(principal)) => {
            let session = state.identity.establish(token.as_deref(), &principal).await;
            Ok(redirect_with_cookie("/student-log", state.session_cookie(&session)?))
        },
        Ok(AuthResult::Rejected(_)) => bounce(&state, &token, "/login", LOGIN_REJECTED).await,
        Err(AppError::AuthRateLimited) => bounce(&state, &token, "/login", LOGIN_LOCKED).await,
        Err(e) => Err(e),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let checked = validate_username(&form.username)
        .and(validate_new_password(&form.password, &state.settings.password_requirements));
    if let Err(e) = checked {
        return bounce(&state, &token, "/register", &e.to_string()).await;
    }

    match state.auth.register(&form.username, &form.password).await? {
        Registration::Created(principal) => {
            let session = state.identity.establish(token.as_deref(), &principal).await;
            Ok(redirect_with_cookie("/student-log", state.session_cookie(&session)?))
        },
        Registration::AlreadyExists => bounce(&state, &token, "/login", ACCOUNT_EXISTS).await,
    }
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
) -> Result<Response, AppError> {
    if token.as_deref().is_none() {
        return Ok(Redirect::to("/").into_response());
    }
    state.identity.logout(token.as_deref()).await?;
    tracing::info!("logged out");
    Ok(redirect_with_cookie("/", state.clear_session_cookie()?))
}

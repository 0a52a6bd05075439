//! Request extractors for the session cookie and the logged-in principal.
use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::Principal;
use crate::cookies::read_cookie;
use crate::error::AppError;
use crate::AppState;

/// The raw session token the browser sent, if any
pub struct SessionToken(pub Option<String>);

impl SessionToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequestParts<Arc<AppState>> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(read_cookie(
            &parts.headers,
            &state.settings.session_cookie,
        )))
    }
}

/// The authenticated principal. Anonymous requests are redirected to `/login`.
pub struct CurrentUser(pub Principal);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, &state.settings.session_cookie);
        state
            .identity
            .current(token.as_deref())
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

//! Session cookie parsing and formatting.
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::AppError;

/// Value of the cookie `name` in the request's `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

/// `Set-Cookie` value that stores a session token
pub fn session_cookie(
    name: &str,
    token: &str,
    ttl: Duration,
    secure: bool,
) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(format!("bad cookie value: {e}")))
}

/// `Set-Cookie` value that makes the browser forget the session
pub fn expired_cookie(name: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))
        .map_err(|e| AppError::Internal(format!("bad cookie value: {e}")))
}

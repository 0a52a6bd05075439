//! HTTP handlers.
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

pub mod auth;
pub mod pages;
pub mod students;

/// 303 redirect that also sets a cookie
fn redirect_with_cookie(location: &str, cookie: HeaderValue) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(location)).into_response()
}

/// Current calendar year, used in page titles
fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

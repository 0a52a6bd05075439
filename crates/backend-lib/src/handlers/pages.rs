use std::sync::Arc;

use axum::{extract::State, response::Html};
use serde_json::json;

use crate::error::AppError;
use crate::AppState;

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    state.views.render("home", &json!({ "title": "Parish Registry" }))
}

//! Page rendering.
//!
//! Templates are compiled into the binary and rendered with Handlebars,
//! which HTML-escapes every `{{value}}`.
use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::AppError;

const PARTIALS: [(&str, &str); 2] = [
    ("header", include_str!("../templates/header.hbs")),
    ("footer", include_str!("../templates/footer.hbs")),
];

const PAGES: [(&str, &str); 7] = [
    ("home", include_str!("../templates/home.hbs")),
    ("login", include_str!("../templates/login.hbs")),
    ("register", include_str!("../templates/register.hbs")),
    ("reg-student", include_str!("../templates/reg-student.hbs")),
    ("student-log", include_str!("../templates/student-log.hbs")),
    ("class-list", include_str!("../templates/class-list.hbs")),
    ("edit-student", include_str!("../templates/edit-student.hbs")),
];

/// Named page templates
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        for (name, source) in PARTIALS {
            registry
                .register_partial(name, source)
                .map_err(|e| AppError::Internal(format!("template {name}: {e}")))?;
        }
        for (name, source) in PAGES {
            registry
                .register_template_string(name, source)
                .map_err(|e| AppError::Internal(format!("template {name}: {e}")))?;
        }
        Ok(Self { registry })
    }

    /// Render the page `name` with `context`
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<Html<String>, AppError> {
        Ok(Html(self.registry.render(name, context)?))
    }
}

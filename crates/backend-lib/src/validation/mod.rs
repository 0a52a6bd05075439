// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Form validation module.

use crate::config::PasswordRequirements;
use parish_common::{StudentDetails, StudentForm, StudentId};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MAX_USERNAME_LENGTH: usize = 254; // RFC 5321 SMTP limit, usernames are often emails
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;
const MAX_FIELD_LENGTH: usize = 500;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_PHONE_LENGTH: usize = 32;
const MAX_AGE: u32 = 120;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9+\-() ]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid student id: {0}")]
    InvalidStudentId(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username. Usernames are matched exactly, so nothing is trimmed.
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if username.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidUsername(
            "Username must not contain whitespace".to_string(),
        ));
    }

    Ok(username)
}

/// Validate a password submitted at login
pub fn validate_login_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password must not be empty".to_string(),
        ));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate a password chosen at registration
pub fn validate_new_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    validate_login_password(password)?;

    if password.chars().count() < requirements.min_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters",
            requirements.min_length
        )));
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain an uppercase letter".to_string(),
        ));
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a lowercase letter".to_string(),
        ));
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a digit".to_string(),
        ));
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a special character".to_string(),
        ));
    }

    Ok(password)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Parse the `studentId` carried by edit and delete forms
pub fn parse_student_id(raw: &str) -> ValidationResult<StudentId> {
    raw.trim()
        .parse::<StudentId>()
        .map_err(|_| ValidationError::InvalidStudentId(format!("`{raw}` is not a record id")))
}

/// Parse an optional age field
pub fn parse_age(raw: &str) -> ValidationResult<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<u32>() {
        Ok(age) if age <= MAX_AGE => Ok(Some(age)),
        _ => Err(ValidationError::InvalidField {
            field: "age",
            reason: format!("must be a whole number between 0 and {MAX_AGE}"),
        }),
    }
}

fn required(field: &'static str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "is required".to_string(),
        });
    }
    bounded(field, value, MAX_NAME_LENGTH)
}

fn bounded(field: &'static str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();
    if value.chars().count() > max {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("cannot exceed {max} characters"),
        });
    }
    Ok(value.to_string())
}

fn phone(field: &'static str, value: &str) -> ValidationResult<String> {
    let value = bounded(field, value, MAX_PHONE_LENGTH)?;
    if !value.is_empty() && !PHONE_REGEX.is_match(&value) {
        return Err(ValidationError::InvalidField {
            field,
            reason: "may only contain digits, spaces and + - ( )".to_string(),
        });
    }
    Ok(value)
}

/// Turn a posted student form into the details that get stored
pub fn validate_student_form(form: &StudentForm) -> ValidationResult<StudentDetails> {
    let parent_email = form.parent_email.trim();
    if !parent_email.is_empty() {
        validate_email(parent_email)?;
    }

    Ok(StudentDetails {
        name: required("name", &form.name)?,
        surname: required("surname", &form.surname)?,
        age: parse_age(&form.age)?,
        birthday: bounded("birthday", &form.birthday, MAX_NAME_LENGTH)?,
        confirmation_year: bounded("confirmation year", &form.confirmation_year, MAX_NAME_LENGTH)?,
        cell_number: phone("cell number", &form.cell_number)?,
        allergies: bounded("allergies", &form.allergies, MAX_FIELD_LENGTH)?,
        school: bounded("school", &form.school, MAX_NAME_LENGTH)?,
        parent_name: bounded("parent name", &form.parent_name, MAX_NAME_LENGTH)?,
        parent_surname: bounded("parent surname", &form.parent_surname, MAX_NAME_LENGTH)?,
        parent_number: phone("parent number", &form.parent_number)?,
        parent_email: parent_email.to_string(),
    })
}

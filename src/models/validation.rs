//! Insert/update validation shared by every entity payload.
//!
//! Each `New*` and `*Update` payload implements [`Validate`]. Handlers call
//! `validate()` before touching the database; a failure maps to HTTP 400.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex compiles")
    })
}

pub fn require_text(field: &'static str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(())
}

pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max_len => Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        )),
        _ => Ok(()),
    }
}

pub fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if email_regex().is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a valid email address"))
    }
}

pub fn optional_email(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => require_email(field, v),
        _ => Ok(()),
    }
}

pub fn non_negative(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => {
            Err(ValidationError::new(field, "must be a non-negative number"))
        }
        _ => Ok(()),
    }
}

pub fn password_strength(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < 8 {
        return Err(ValidationError::new(field, "must be at least 8 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        let err = require_text("name", "   ", 10).unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "is required");
    }

    #[test]
    fn overlong_text_is_rejected() {
        assert!(require_text("name", "abcdef", 5).is_err());
        assert!(optional_text("notes", Some("abcdef"), 5).is_err());
        assert!(optional_text("notes", None, 5).is_ok());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(require_email("email", "ana@example.com").is_ok());
        assert!(require_email("email", "ana.example.com").is_err());
        assert!(optional_email("email", Some("")).is_ok());
        assert!(optional_email("email", Some("nope")).is_err());
    }

    #[test]
    fn negative_and_nan_budgets_are_rejected() {
        assert!(non_negative("cuBudget", Some(-1.0)).is_err());
        assert!(non_negative("cuBudget", Some(f64::NAN)).is_err());
        assert!(non_negative("cuBudget", Some(0.0)).is_ok());
    }
}

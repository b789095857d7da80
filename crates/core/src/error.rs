//! Domain error model.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Per-field validation messages, keyed by input field name.
///
/// Serialized as `{"field": ["message", ...]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Domain-level error.
///
/// Deterministic business failures only. Transport and storage concerns are
/// mapped elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more input fields failed validation.
    #[error("validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was hit.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    /// Single-field validation failure.
    pub fn field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![msg.into()]);
        Self::Validation(errors)
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, msgs)| format!("{field}: {}", msgs.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_fields_in_order() {
        let mut errors = FieldErrors::new();
        errors.insert("username".into(), vec!["This field is required.".into()]);
        errors.insert("password".into(), vec!["This field is required.".into()]);

        let msg = DomainError::Validation(errors).to_string();
        assert_eq!(
            msg,
            "validation failed: password: This field is required.; username: This field is required."
        );
    }

    #[test]
    fn field_helper_builds_single_entry() {
        let DomainError::Validation(errors) = DomainError::field("quantity", "must be positive") else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["quantity"], vec!["must be positive".to_string()]);
    }
}

//! Unified error types for the domain layer
//!
//! Expected divergence (reverting an absent scope, finding no conflicts) is
//! never an error. These variants cover malformed input only: payloads that
//! do not fit the record schema, invalid scope identifiers, unparseable
//! reference data.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Scope identifier is malformed
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// A choice carried a payload that does not match the field's kind
    #[error("Field {field} expects {expected}, got {found}")]
    FieldMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if picks.len() > count {
    ///     return Err(DomainError::validation("Too many picks for feature"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid scope error
    pub fn invalid_scope(msg: impl Into<String>) -> Self {
        Self::InvalidScope(msg.into())
    }

    /// Create a field/payload mismatch error
    pub fn field_mismatch(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::FieldMismatch {
            field: field.into(),
            expected,
            found,
        }
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant or format.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("too many picks");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: too many picks");
    }

    #[test]
    fn test_field_mismatch_error() {
        let err = DomainError::field_mismatch("skills", "a list of strings", "text");
        assert_eq!(err.to_string(), "Field skills expects a list of strings, got text");
    }

    #[test]
    fn test_invalid_scope_error() {
        let err = DomainError::invalid_scope("scope id cannot be empty");
        assert_eq!(err.to_string(), "Invalid scope: scope id cannot be empty");
    }
}

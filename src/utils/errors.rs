//! Error handling for the school journal
//! 
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Main error type for the school journal application
#[derive(Error, Debug)]
pub enum SchoolError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("PDF rendering error: {0}")]
    Pdf(String),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication failed: {0}")]
    Authentication(AuthFailure),

    #[error("Authentication required")]
    Unauthenticated,
    
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: i64 },
}

/// Why a login attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown email or wrong password; the two are deliberately indistinguishable
    InvalidCredentials,
    /// Correct credentials for a deactivated account
    AccountDisabled,
}

impl AuthFailure {
    /// Translation key of the user-facing message
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "invalid_credentials",
            AuthFailure::AccountDisabled => "account_disabled",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single validation failure, optionally attached to a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// `None` for errors that concern the whole form
    pub field: Option<String>,
    /// Translation key of the message
    pub code: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

/// Collected validation failures of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single field error
    pub fn single(field: &str, code: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, code);
        errors
    }

    /// Shorthand for a single error that is not tied to a field
    pub fn non_field(code: &str) -> Self {
        let mut errors = Self::new();
        errors.add_non_field(code);
        errors
    }

    pub fn add(&mut self, field: &str, code: &str) {
        self.errors.push(FieldError {
            field: Some(field.to_string()),
            code: code.to_string(),
            params: HashMap::new(),
        });
    }

    pub fn add_with_param(&mut self, field: &str, code: &str, name: &str, value: impl ToString) {
        let mut params = HashMap::new();
        params.insert(name.to_string(), value.to_string());
        self.errors.push(FieldError {
            field: Some(field.to_string()),
            code: code.to_string(),
            params,
        });
    }

    pub fn add_non_field(&mut self, code: &str) {
        self.errors.push(FieldError {
            field: None,
            code: code.to_string(),
            params: HashMap::new(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `field` (or the form itself, for `None`) carries error `code`
    pub fn has(&self, field: Option<&str>, code: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field.as_deref() == field && e.code == code)
    }

    /// Whether any error is attached to `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field.as_deref() == Some(field))
    }

    /// Turn the collected errors into a result
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SchoolError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| match &e.field {
                Some(field) => format!("{}: {}", field, e.code),
                None => e.code.clone(),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

impl From<ValidationErrors> for SchoolError {
    fn from(errors: ValidationErrors) -> Self {
        SchoolError::Validation(errors)
    }
}

impl From<genpdf::error::Error> for SchoolError {
    fn from(error: genpdf::error::Error) -> Self {
        SchoolError::Pdf(error.to_string())
    }
}

/// Result type alias for school journal operations
pub type Result<T> = std::result::Result<T, SchoolError>;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn sqlstate(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// Name of the unique constraint a database error violated, if any
pub fn violated_unique_constraint(error: &sqlx::Error) -> Option<String> {
    if sqlstate(error).as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }
    error
        .as_database_error()
        .and_then(|db| db.constraint())
        .map(str::to_string)
}

/// Map a unique-constraint violation to a validation error, pass anything else through
pub fn unique_violation_as(error: sqlx::Error, field: Option<&str>, code: &str) -> SchoolError {
    if sqlstate(&error).as_deref() == Some(UNIQUE_VIOLATION) {
        match field {
            Some(field) => ValidationErrors::single(field, code).into(),
            None => ValidationErrors::non_field(code).into(),
        }
    } else {
        SchoolError::Database(error)
    }
}

/// Map a foreign-key violation (e.g. a protected reference) to a validation error
pub fn foreign_key_violation_as(error: sqlx::Error, code: &str) -> SchoolError {
    if sqlstate(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
        ValidationErrors::non_field(code).into()
    } else {
        SchoolError::Database(error)
    }
}

impl SchoolError {
    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SchoolError::Validation(_)
                | SchoolError::Authentication(_)
                | SchoolError::Unauthenticated
                | SchoolError::PermissionDenied(_)
                | SchoolError::NotFound { .. }
        )
    }
    
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SchoolError::Database(_) => ErrorSeverity::Critical,
            SchoolError::Migration(_) => ErrorSeverity::Critical,
            SchoolError::Config(_) => ErrorSeverity::Critical,
            SchoolError::PermissionDenied(_) => ErrorSeverity::Warning,
            SchoolError::Authentication(_) => ErrorSeverity::Warning,
            SchoolError::Unauthenticated => ErrorSeverity::Info,
            SchoolError::Validation(_) => ErrorSeverity::Info,
            SchoolError::NotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validation_errors_collect_and_query() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("email", "email_taken");
        errors.add_non_field("password_mismatch");

        assert!(errors.has(Some("email"), "email_taken"));
        assert!(errors.has(None, "password_mismatch"));
        assert!(!errors.has(Some("password1"), "password_mismatch"));
        assert!(errors.has_field("email"));
        assert_eq!(errors.to_string(), "email: email_taken, password_mismatch");
        assert_matches!(errors.into_result(), Err(SchoolError::Validation(_)));
    }

    #[test]
    fn test_severity_and_client_errors() {
        let not_found = SchoolError::NotFound { resource: "lesson", id: 7 };
        assert_eq!(not_found.to_string(), "lesson not found: 7");
        assert!(not_found.is_client_error());
        assert_eq!(not_found.severity(), ErrorSeverity::Info);

        let config = SchoolError::Config("missing".to_string());
        assert!(!config.is_client_error());
        assert_eq!(config.severity(), ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn test_non_database_errors_pass_through_constraint_mapping() {
        let mapped = unique_violation_as(sqlx::Error::RowNotFound, Some("email"), "email_taken");
        assert_matches!(mapped, SchoolError::Database(sqlx::Error::RowNotFound));
        assert_eq!(violated_unique_constraint(&sqlx::Error::RowNotFound), None);
    }

    #[test]
    fn test_auth_failure_codes_are_distinct() {
        assert_ne!(AuthFailure::InvalidCredentials.code(), AuthFailure::AccountDisabled.code());
    }
}

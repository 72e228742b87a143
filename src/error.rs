//! Unified error hierarchy for HappyFeet
//!
//! Every service operation returns [`Result`]. The variants map onto the
//! HTTP-style status codes the API surface reports, so a front end can turn
//! any error into a response without inspecting its message.

use thiserror::Error;

/// Top-level error type for all HappyFeet operations
#[derive(Debug, Error)]
pub enum HappyFeetError {
    /// Input failed a model invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Record conflicts with an existing one (e.g. email already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or bad credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller may not act on the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Password hashing or token signing failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Store operation errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Store operation errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record not found: {table}.{id}")]
    NotFound { table: String, id: String },

    #[error("Duplicate entry: {table}.{key}")]
    Duplicate { table: String, key: String },
}

/// Result type alias for HappyFeet operations
pub type Result<T> = std::result::Result<T, HappyFeetError>;

impl HappyFeetError {
    /// HTTP status code a front end should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            HappyFeetError::Validation(_) => 422,
            HappyFeetError::NotFound(_) => 404,
            HappyFeetError::Database(DatabaseError::NotFound { .. }) => 404,
            HappyFeetError::Conflict(_) => 409,
            HappyFeetError::Database(DatabaseError::Duplicate { .. }) => 409,
            HappyFeetError::Unauthorized(_) => 401,
            HappyFeetError::Forbidden(_) => 403,
            HappyFeetError::Configuration(_) => 400,
            _ => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self.status_code() {
            400 => "BAD_REQUEST",
            401 => "UNAUTHORIZED",
            403 => "FORBIDDEN",
            404 => "NOT_FOUND",
            409 => "CONFLICT",
            422 => "VALIDATION_ERROR",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HappyFeetError::Validation(_)
            | HappyFeetError::NotFound(_)
            | HappyFeetError::Conflict(_)
            | HappyFeetError::Database(DatabaseError::NotFound { .. })
            | HappyFeetError::Database(DatabaseError::Duplicate { .. }) => ErrorSeverity::Warning,
            HappyFeetError::Unauthorized(_) | HappyFeetError::Forbidden(_) => ErrorSeverity::Info,
            HappyFeetError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message. Server-side failures never leak details.
    pub fn user_message(&self) -> String {
        match self {
            HappyFeetError::NotFound(what) => format!("{} not found", what),
            HappyFeetError::Database(DatabaseError::NotFound { table, .. }) => {
                format!("No matching {} record", table)
            }
            HappyFeetError::Database(DatabaseError::Duplicate { .. }) => {
                "A record with the same key already exists".to_string()
            }
            HappyFeetError::Unauthorized(msg) | HappyFeetError::Forbidden(msg) => msg.clone(),
            HappyFeetError::Validation(msg) | HappyFeetError::Conflict(msg) => msg.clone(),
            _ if self.status_code() >= 500 => "Something went wrong".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HappyFeetError::Validation("x".into()).status_code(), 422);
        assert_eq!(HappyFeetError::NotFound("User".into()).status_code(), 404);
        assert_eq!(HappyFeetError::Conflict("email".into()).status_code(), 409);
        assert_eq!(HappyFeetError::Unauthorized("no".into()).status_code(), 401);
        assert_eq!(HappyFeetError::Forbidden("no".into()).status_code(), 403);
        assert_eq!(HappyFeetError::Internal("boom".into()).status_code(), 500);

        let dup = HappyFeetError::Database(DatabaseError::Duplicate {
            table: "users".into(),
            key: "a@b.com".into(),
        });
        assert_eq!(dup.status_code(), 409);
        assert_eq!(dup.code(), "CONFLICT");
    }

    #[test]
    fn test_error_severity() {
        let err = HappyFeetError::NotFound("Training plan".into());
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = HappyFeetError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_user_messages_hide_internal_details() {
        let err = HappyFeetError::Auth("bcrypt cost out of range".into());
        assert_eq!(err.user_message(), "Something went wrong");

        let err = HappyFeetError::Conflict("Email already in use".into());
        assert_eq!(err.user_message(), "Email already in use");
    }
}

use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Database(String),
    Storage(String),
    NotFound(String),
    InvalidInput(String),
    ValidationError(String),
    SerializationError(String),
    Internal(String),
}

impl AppError {
    /// Re-wraps the message with operation context while keeping the
    /// variant, so callers can still distinguish retryable store errors
    /// from contract violations.
    pub fn with_context(self, context: &str) -> Self {
        match self {
            AppError::Database(msg) => AppError::Database(format!("{context}: {msg}")),
            AppError::Storage(msg) => AppError::Storage(format!("{context}: {msg}")),
            AppError::NotFound(msg) => AppError::NotFound(format!("{context}: {msg}")),
            AppError::InvalidInput(msg) => AppError::InvalidInput(format!("{context}: {msg}")),
            AppError::ValidationError(msg) => AppError::ValidationError(format!("{context}: {msg}")),
            AppError::SerializationError(msg) => {
                AppError::SerializationError(format!("{context}: {msg}"))
            }
            AppError::Internal(msg) => AppError::Internal(format!("{context}: {msg}")),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category_and_message() {
        let err = AppError::ValidationError("patch is empty".to_string());
        assert_eq!(err.to_string(), "Validation error: patch is empty");

        let err = AppError::NotFound("record shot1".to_string());
        assert_eq!(err.to_string(), "Not found: record shot1");
    }

    #[test]
    fn test_with_context_keeps_variant() {
        let err = AppError::Database("connection reset".to_string())
            .with_context("duplicate failed for entity shot1");
        match err {
            AppError::Database(msg) => {
                assert_eq!(msg, "duplicate failed for entity shot1: connection reset");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_from_serde_json_maps_to_serialization_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = AppError::from(parse_err);
        assert!(matches!(err, AppError::SerializationError(_)));
    }
}

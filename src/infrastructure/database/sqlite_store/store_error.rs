use crate::shared::error::AppError;
use thiserror::Error;

/// Row-level failures surfaced while mapping stored data back into domain
/// types. Separate from `AppError` so the mapper can say exactly which row
/// was malformed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid field document for {entity_id}: {reason}")]
    FieldDocument { entity_id: String, reason: String },
    #[error("invalid stored value in {column}: {reason}")]
    Column { column: String, reason: String },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::FieldDocument { .. } => AppError::SerializationError(err.to_string()),
            StoreError::Column { .. } => AppError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_app_error_categories() {
        let err: AppError = StoreError::FieldDocument {
            entity_id: "shot1".into(),
            reason: "not json".into(),
        }
        .into();
        assert!(matches!(err, AppError::SerializationError(_)));

        let err: AppError = StoreError::Column {
            column: "change_type".into(),
            reason: "unknown".into(),
        }
        .into();
        assert!(matches!(err, AppError::Database(_)));
    }
}

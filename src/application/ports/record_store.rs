use crate::domain::entities::{EntityRecord, RecordDraft};
use crate::domain::value_objects::EntityId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Primary-state persistence. Timestamps are server-assigned inside the
/// store; callers never supply them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes the full initial state of a new record.
    async fn insert(&self, draft: RecordDraft) -> Result<EntityRecord, AppError>;

    /// Direct id lookup; returns soft-deleted records too (they stay
    /// readable for audit).
    async fn get(&self, entity_id: &EntityId) -> Result<Option<EntityRecord>, AppError>;

    /// Merges an already-sanitized field document into the record. The
    /// `containerId` and `deleted` keys route to their columns; everything
    /// else merges into the field document. Last write wins.
    async fn apply_patch(
        &self,
        entity_id: &EntityId,
        fields: &Map<String, Value>,
        updated_by: &str,
    ) -> Result<(), AppError>;
}

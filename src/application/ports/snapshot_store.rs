use crate::domain::entities::{NewSnapshot, VersionSnapshot};
use crate::domain::value_objects::{EntityId, SequenceNumber};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Append-only version history. Nothing mutates or deletes snapshots
/// through this interface; retention is an external policy.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Appends a snapshot, assigning the next per-entity sequence number
    /// and the capture timestamp. Assignment is atomic per entity.
    async fn append(&self, snapshot: NewSnapshot) -> Result<SequenceNumber, AppError>;

    /// Snapshots for one entity, newest first (strictly descending
    /// sequence). `before_sequence` pages backwards through history.
    async fn list_by_entity(
        &self,
        entity_id: &EntityId,
        limit: u32,
        before_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<VersionSnapshot>, AppError>;

    async fn latest(&self, entity_id: &EntityId) -> Result<Option<VersionSnapshot>, AppError>;
}

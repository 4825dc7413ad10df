use crate::application::ports::SnapshotStore;
use crate::domain::entities::record::{CONTAINER_FIELD, DELETED_FIELD};
use crate::domain::entities::{EntityRecord, VersionSnapshot};
use crate::domain::value_objects::{EntityId, SequenceNumber};
use crate::shared::config::HistoryConfig;
use crate::shared::error::AppError;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Read side of the version history: paging, latest, and reconstruction of
/// past states by replaying pre-images.
pub struct VersionHistoryService {
    snapshots: Arc<dyn SnapshotStore>,
    config: HistoryConfig,
}

impl VersionHistoryService {
    pub fn new(snapshots: Arc<dyn SnapshotStore>, config: HistoryConfig) -> Self {
        Self { snapshots, config }
    }

    pub async fn list_by_entity(
        &self,
        entity_id: &EntityId,
        limit: Option<u32>,
        before_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<VersionSnapshot>, AppError> {
        let limit = limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size);
        self.snapshots
            .list_by_entity(entity_id, limit, before_sequence)
            .await
    }

    pub async fn latest(&self, entity_id: &EntityId) -> Result<Option<VersionSnapshot>, AppError> {
        self.snapshots.latest(entity_id).await
    }

    /// Fields as they stood immediately after `sequence_no` was applied,
    /// reconstructed by overlaying the pre-images of every newer snapshot
    /// onto the current state, newest first.
    ///
    /// A pre-image only records fields that existed at capture time, so a
    /// field first created after `sequence_no` simply remains in the result;
    /// the diff chain cannot distinguish "absent" from "untouched".
    pub async fn state_at(
        &self,
        current: &EntityRecord,
        sequence_no: SequenceNumber,
    ) -> Result<Map<String, Value>, AppError> {
        let mut fields = current.fields.clone();
        fields.insert(
            CONTAINER_FIELD.to_string(),
            Value::String(current.container_id.to_string()),
        );
        fields.insert(DELETED_FIELD.to_string(), Value::Bool(current.deleted));

        let mut cursor: Option<SequenceNumber> = None;
        'rewind: loop {
            let page = self
                .snapshots
                .list_by_entity(&current.id, self.config.max_page_size, cursor)
                .await?;
            if page.is_empty() {
                break;
            }
            for snapshot in &page {
                if snapshot.sequence_no <= sequence_no {
                    break 'rewind;
                }
                if let Some(captured) = &snapshot.captured_fields {
                    for (name, value) in captured {
                        fields.insert(name.clone(), value.clone());
                    }
                }
                cursor = Some(snapshot.sequence_no);
            }
        }

        Ok(fields)
    }
}

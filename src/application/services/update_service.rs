use crate::application::ports::{RecordStore, SnapshotStore};
use crate::domain::entities::{ChangeType, EntityRecord, NewSnapshot, RecordDraft, SnapshotActor};
use crate::domain::entities::record::DELETED_FIELD;
use crate::domain::value_objects::{ContainerId, EntityId, EntityKind, Patch, UpdateSource, UserIdentity};
use crate::shared::error::AppError;
use crate::shared::metrics::{RECORD_WRITES, SNAPSHOT_APPENDS};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

#[async_trait]
pub trait UpdateServiceTrait: Send + Sync {
    /// Applies a patch to the entity's primary state and appends an update
    /// snapshot carrying the pre-image computed from `current`.
    async fn apply(
        &self,
        entity_id: EntityId,
        current: EntityRecord,
        patch: Patch,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<(), AppError>;

    /// Soft delete: `{deleted: true}` with a delete snapshot. There is no
    /// undelete in this core.
    async fn apply_delete(
        &self,
        entity_id: EntityId,
        current: EntityRecord,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<(), AppError>;

    /// Writes full initial state plus one create snapshot whose captured
    /// fields are `None` (there is no pre-image for a creation).
    async fn apply_create(
        &self,
        entity_id: EntityId,
        entity_kind: EntityKind,
        container_id: ContainerId,
        initial_fields: Patch,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<EntityRecord, AppError>;
}

pub struct UpdateService {
    records: Arc<dyn RecordStore>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl UpdateService {
    pub fn new(records: Arc<dyn RecordStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { records, snapshots }
    }

    fn validate_actor(acting_user: &UserIdentity) -> Result<(), AppError> {
        if acting_user.uid.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Acting user uid is missing".to_string(),
            ));
        }
        Ok(())
    }

    /// Subset of `current` keyed by the sanitized patch's field names.
    /// Fields the entity never had are simply absent from the pre-image.
    fn pre_image(current: &EntityRecord, fields: &Map<String, Value>) -> Map<String, Value> {
        let mut captured = Map::new();
        for name in fields.keys() {
            if let Some(value) = current.field(name) {
                captured.insert(name.clone(), value);
            }
        }
        captured
    }

    async fn apply_with_change(
        &self,
        entity_id: EntityId,
        current: &EntityRecord,
        patch: Patch,
        acting_user: UserIdentity,
        source: UpdateSource,
        change_type: ChangeType,
    ) -> Result<(), AppError> {
        Self::validate_actor(&acting_user)?;
        let fields = patch.sanitize();
        if fields.is_empty() {
            return Err(AppError::ValidationError(
                "Patch is empty after sanitization".to_string(),
            ));
        }

        let captured = Self::pre_image(current, &fields);

        match self
            .records
            .apply_patch(&entity_id, &fields, &acting_user.uid)
            .await
        {
            Ok(()) => RECORD_WRITES.record_success(),
            Err(err) => {
                RECORD_WRITES.record_failure();
                return Err(err);
            }
        }

        let snapshot = NewSnapshot::new(
            entity_id.clone(),
            Some(captured),
            change_type,
            SnapshotActor::from_identity(&acting_user),
            source,
        );
        self.append_best_effort(&entity_id, snapshot).await;

        Ok(())
    }

    /// Losing one audit entry must never block the user's edit, so a failed
    /// snapshot append is logged and counted but never surfaced.
    async fn append_best_effort(&self, entity_id: &EntityId, snapshot: NewSnapshot) {
        match self.snapshots.append(snapshot).await {
            Ok(_) => SNAPSHOT_APPENDS.record_success(),
            Err(err) => {
                SNAPSHOT_APPENDS.record_failure();
                tracing::warn!(
                    target: "callboard::history",
                    entity_id = %entity_id,
                    error = %err,
                    "version snapshot append failed; primary update kept"
                );
            }
        }
    }
}

#[async_trait]
impl UpdateServiceTrait for UpdateService {
    async fn apply(
        &self,
        entity_id: EntityId,
        current: EntityRecord,
        patch: Patch,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<(), AppError> {
        self.apply_with_change(
            entity_id,
            &current,
            patch,
            acting_user,
            source,
            ChangeType::Update,
        )
        .await
    }

    async fn apply_delete(
        &self,
        entity_id: EntityId,
        current: EntityRecord,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<(), AppError> {
        let patch = Patch::new().set(DELETED_FIELD, true);
        self.apply_with_change(
            entity_id,
            &current,
            patch,
            acting_user,
            source,
            ChangeType::Delete,
        )
        .await
    }

    async fn apply_create(
        &self,
        entity_id: EntityId,
        entity_kind: EntityKind,
        container_id: ContainerId,
        initial_fields: Patch,
        acting_user: UserIdentity,
        source: UpdateSource,
    ) -> Result<EntityRecord, AppError> {
        Self::validate_actor(&acting_user)?;
        let fields = initial_fields.sanitize();

        let draft = RecordDraft::new(
            entity_id.clone(),
            entity_kind,
            container_id,
            fields,
            acting_user.uid.clone(),
        );

        let record = match self.records.insert(draft).await {
            Ok(record) => {
                RECORD_WRITES.record_success();
                record
            }
            Err(err) => {
                RECORD_WRITES.record_failure();
                return Err(err);
            }
        };

        let snapshot = NewSnapshot::new(
            entity_id.clone(),
            None,
            ChangeType::Create,
            SnapshotActor::from_identity(&acting_user),
            source,
        );
        self.append_best_effort(&entity_id, snapshot).await;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::{mock, predicate::*};
    use serde_json::json;

    mock! {
        pub Records {}

        #[async_trait]
        impl RecordStore for Records {
            async fn insert(&self, draft: RecordDraft) -> Result<EntityRecord, AppError>;
            async fn get(&self, entity_id: &EntityId) -> Result<Option<EntityRecord>, AppError>;
            async fn apply_patch(
                &self,
                entity_id: &EntityId,
                fields: &Map<String, Value>,
                updated_by: &str,
            ) -> Result<(), AppError>;
        }
    }

    mock! {
        pub Snapshots {}

        #[async_trait]
        impl SnapshotStore for Snapshots {
            async fn append(&self, snapshot: NewSnapshot) -> Result<crate::domain::value_objects::SequenceNumber, AppError>;
            async fn list_by_entity(
                &self,
                entity_id: &EntityId,
                limit: u32,
                before_sequence: Option<crate::domain::value_objects::SequenceNumber>,
            ) -> Result<Vec<crate::domain::entities::VersionSnapshot>, AppError>;
            async fn latest(&self, entity_id: &EntityId) -> Result<Option<crate::domain::entities::VersionSnapshot>, AppError>;
        }
    }

    fn user() -> UserIdentity {
        UserIdentity::new("u1".into(), "Ava".into(), "ava@example.com".into(), None)
    }

    fn record() -> EntityRecord {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Shot 1"));
        fields.insert("notes".to_string(), json!("old notes"));
        EntityRecord {
            id: EntityId::new("shot1".into()).unwrap(),
            kind: EntityKind::new("shot".into()).unwrap(),
            container_id: ContainerId::new("proj1".into()).unwrap(),
            fields,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            updated_by: "u1".to_string(),
        }
    }

    fn source(label: &str) -> UpdateSource {
        UpdateSource::new(label.to_string()).unwrap()
    }

    fn service(records: MockRecords, snapshots: MockSnapshots) -> UpdateService {
        UpdateService::new(Arc::new(records), Arc::new(snapshots))
    }

    #[tokio::test]
    async fn test_apply_captures_pre_image_of_patched_fields_only() {
        let mut records = MockRecords::new();
        records
            .expect_apply_patch()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut snapshots = MockSnapshots::new();
        snapshots
            .expect_append()
            .withf(|snapshot| {
                let captured = snapshot.captured_fields.as_ref().unwrap();
                captured.len() == 1
                    && captured.get("notes") == Some(&json!("old notes"))
                    && snapshot.change_type == ChangeType::Update
            })
            .times(1)
            .returning(|_| Ok(crate::domain::value_objects::SequenceNumber::new(2).unwrap()));

        let patch = Patch::new().set("notes", "new notes");
        let result = service(records, snapshots)
            .apply(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                patch,
                user(),
                source("shot_editor"),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_apply_swallows_snapshot_append_failure() {
        let mut records = MockRecords::new();
        records
            .expect_apply_patch()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut snapshots = MockSnapshots::new();
        snapshots
            .expect_append()
            .times(1)
            .returning(|_| Err(AppError::Database("history collection down".into())));

        let patch = Patch::new().set("title", "Shot 1b");
        let result = service(records, snapshots)
            .apply(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                patch,
                user(),
                source("shot_editor"),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_apply_propagates_primary_write_failure_without_snapshot() {
        let mut records = MockRecords::new();
        records
            .expect_apply_patch()
            .times(1)
            .returning(|_, _, _| Err(AppError::Database("write failed".into())));
        // No append expectation: a failed primary write must not append.
        let snapshots = MockSnapshots::new();

        let patch = Patch::new().set("title", "Shot 1b");
        let result = service(records, snapshots)
            .apply(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                patch,
                user(),
                source("shot_editor"),
            )
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_apply_rejects_empty_patch_before_any_io() {
        let records = MockRecords::new();
        let snapshots = MockSnapshots::new();

        let patch = Patch::new().set("ghost", crate::domain::value_objects::PatchValue::Unset);
        let result = service(records, snapshots)
            .apply(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                patch,
                user(),
                source("shot_editor"),
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_apply_rejects_blank_actor_uid() {
        let records = MockRecords::new();
        let snapshots = MockSnapshots::new();

        let blank = UserIdentity::new("  ".into(), "Ava".into(), String::new(), None);
        let result = service(records, snapshots)
            .apply(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                Patch::new().set("title", "x"),
                blank,
                source("shot_editor"),
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_apply_create_writes_create_snapshot_without_pre_image() {
        let mut records = MockRecords::new();
        records.expect_insert().times(1).returning(|draft| {
            let now = Utc::now();
            Ok(EntityRecord {
                id: draft.id,
                kind: draft.kind,
                container_id: draft.container_id,
                fields: draft.fields,
                deleted: false,
                created_at: now,
                updated_at: now,
                updated_by: draft.created_by,
            })
        });
        let mut snapshots = MockSnapshots::new();
        snapshots
            .expect_append()
            .withf(|snapshot| {
                snapshot.captured_fields.is_none() && snapshot.change_type == ChangeType::Create
            })
            .times(1)
            .returning(|_| Ok(crate::domain::value_objects::SequenceNumber::new(1).unwrap()));

        let created = service(records, snapshots)
            .apply_create(
                EntityId::new("shot2".into()).unwrap(),
                EntityKind::new("shot".into()).unwrap(),
                ContainerId::new("proj1".into()).unwrap(),
                Patch::new().set("title", "Shot 2"),
                user(),
                source("shot_creator"),
            )
            .await
            .unwrap();
        assert_eq!(created.fields.get("title"), Some(&json!("Shot 2")));
    }

    #[tokio::test]
    async fn test_apply_delete_marks_deleted_with_delete_snapshot() {
        let mut records = MockRecords::new();
        records
            .expect_apply_patch()
            .withf(|_, fields, _| fields.get("deleted") == Some(&json!(true)))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut snapshots = MockSnapshots::new();
        snapshots
            .expect_append()
            .withf(|snapshot| {
                snapshot.change_type == ChangeType::Delete
                    && snapshot.captured_fields.as_ref().unwrap().get("deleted") == Some(&json!(false))
            })
            .times(1)
            .returning(|_| Ok(crate::domain::value_objects::SequenceNumber::new(3).unwrap()));

        let result = service(records, snapshots)
            .apply_delete(
                EntityId::new("shot1".into()).unwrap(),
                record(),
                user(),
                source("shot_actions"),
            )
            .await;
        assert!(result.is_ok());
    }
}

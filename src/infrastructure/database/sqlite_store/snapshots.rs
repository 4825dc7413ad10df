use super::mapper::map_snapshot_row;
use super::queries::{INSERT_SNAPSHOT, SELECT_LATEST_SNAPSHOT, SELECT_SNAPSHOTS_BY_ENTITY};
use crate::application::ports::SnapshotStore;
use crate::domain::entities::{NewSnapshot, VersionSnapshot};
use crate::domain::value_objects::{EntityId, SequenceNumber};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

/// Concurrent appends for the same entity can compute the same MAX+1; the
/// UNIQUE(entity_id, sequence_no) index turns that race into a retry.
const MAX_SEQUENCE_RETRIES: u32 = 3;

pub struct SqliteSnapshotStore {
    pool: ConnectionPool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn append(&self, snapshot: NewSnapshot) -> Result<SequenceNumber, AppError> {
        let captured_json = match &snapshot.captured_fields {
            Some(fields) => Some(serde_json::to_string(fields)?),
            None => None,
        };
        let captured_at = Utc::now().timestamp_millis();

        let mut attempt = 0;
        loop {
            let result = sqlx::query_scalar::<_, i64>(INSERT_SNAPSHOT)
                .bind(snapshot.entity_id.as_str())
                .bind(captured_json.as_deref())
                .bind(snapshot.change_type.as_str())
                .bind(&snapshot.acting_user.id)
                .bind(&snapshot.acting_user.display_name)
                .bind(snapshot.acting_user.avatar_url.as_deref())
                .bind(captured_at)
                .bind(snapshot.source.as_str())
                .fetch_one(self.pool.get_pool())
                .await;

            match result {
                Ok(sequence_no) => {
                    return SequenceNumber::new(sequence_no).map_err(AppError::Internal)
                }
                Err(err) if attempt < MAX_SEQUENCE_RETRIES && is_unique_violation(&err) => {
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn list_by_entity(
        &self,
        entity_id: &EntityId,
        limit: u32,
        before_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<VersionSnapshot>, AppError> {
        let rows = sqlx::query(SELECT_SNAPSHOTS_BY_ENTITY)
            .bind(entity_id.as_str())
            .bind(before_sequence.map(|seq| seq.value()))
            .bind(limit.max(1) as i64)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            snapshots.push(map_snapshot_row(&row)?);
        }
        Ok(snapshots)
    }

    async fn latest(&self, entity_id: &EntityId) -> Result<Option<VersionSnapshot>, AppError> {
        let row = sqlx::query(SELECT_LATEST_SNAPSHOT)
            .bind(entity_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_snapshot_row(&row)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChangeType, SnapshotActor};
    use crate::domain::value_objects::UpdateSource;
    use serde_json::json;

    async fn setup_store() -> SqliteSnapshotStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        SqliteSnapshotStore::new(pool)
    }

    fn actor() -> SnapshotActor {
        SnapshotActor {
            id: "u1".to_string(),
            display_name: "Ava".to_string(),
            avatar_url: Some("https://example.com/ava.png".to_string()),
        }
    }

    fn update_snapshot(entity: &str, captured: serde_json::Value) -> NewSnapshot {
        let serde_json::Value::Object(map) = captured else {
            unreachable!()
        };
        NewSnapshot::new(
            EntityId::new(entity.into()).unwrap(),
            Some(map),
            ChangeType::Update,
            actor(),
            UpdateSource::new("test".into()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequences_per_entity() {
        let store = setup_store().await;

        let first = store
            .append(update_snapshot("shot1", json!({"title": "a"})))
            .await
            .unwrap();
        let second = store
            .append(update_snapshot("shot1", json!({"title": "b"})))
            .await
            .unwrap();
        let other = store
            .append(update_snapshot("shot2", json!({"title": "x"})))
            .await
            .unwrap();

        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        // Sequences are per entity, not global.
        assert_eq!(other.value(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_pages_backwards() {
        let store = setup_store().await;
        for i in 0..5 {
            store
                .append(update_snapshot("shot1", json!({"title": format!("v{i}")})))
                .await
                .unwrap();
        }

        let entity = EntityId::new("shot1".into()).unwrap();
        let first_page = store.list_by_entity(&entity, 2, None).await.unwrap();
        let sequences: Vec<i64> = first_page.iter().map(|s| s.sequence_no.value()).collect();
        assert_eq!(sequences, vec![5, 4]);

        let next_page = store
            .list_by_entity(&entity, 2, Some(first_page.last().unwrap().sequence_no))
            .await
            .unwrap();
        let sequences: Vec<i64> = next_page.iter().map(|s| s.sequence_no.value()).collect();
        assert_eq!(sequences, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_latest_returns_highest_sequence() {
        let store = setup_store().await;
        let entity = EntityId::new("shot1".into()).unwrap();
        assert!(store.latest(&entity).await.unwrap().is_none());

        store
            .append(update_snapshot("shot1", json!({"title": "a"})))
            .await
            .unwrap();
        store
            .append(update_snapshot("shot1", json!({"title": "b"})))
            .await
            .unwrap();

        let latest = store.latest(&entity).await.unwrap().unwrap();
        assert_eq!(latest.sequence_no.value(), 2);
        assert_eq!(
            latest.captured_fields.as_ref().unwrap().get("title"),
            Some(&json!("b"))
        );
        assert_eq!(latest.acting_user.display_name, "Ava");
    }

    #[tokio::test]
    async fn test_create_snapshot_round_trips_null_pre_image() {
        let store = setup_store().await;
        let snapshot = NewSnapshot::new(
            EntityId::new("shot1".into()).unwrap(),
            None,
            ChangeType::Create,
            actor(),
            UpdateSource::new("test".into()).unwrap(),
        );
        store.append(snapshot).await.unwrap();

        let latest = store
            .latest(&EntityId::new("shot1".into()).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.change_type, ChangeType::Create);
        assert!(latest.captured_fields.is_none());
    }
}

use super::mapper::{map_record_row, parse_field_document};
use super::queries::{
    INSERT_RECORD, SELECT_RECORD_BY_ID, SELECT_RECORD_FIELDS, UPDATE_RECORD_STATE,
};
use crate::application::ports::RecordStore;
use crate::domain::entities::record::{CONTAINER_FIELD, DELETED_FIELD};
use crate::domain::entities::{EntityRecord, RecordDraft};
use crate::domain::value_objects::EntityId;
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::Row;

pub struct SqliteRecordStore {
    pool: ConnectionPool,
}

impl SqliteRecordStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, draft: RecordDraft) -> Result<EntityRecord, AppError> {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let fields_json = serde_json::to_string(&draft.fields)?;

        sqlx::query(INSERT_RECORD)
            .bind(draft.id.as_str())
            .bind(draft.kind.as_str())
            .bind(draft.container_id.as_str())
            .bind(&fields_json)
            .bind(now_ms)
            .bind(&draft.created_by)
            .execute(self.pool.get_pool())
            .await?;

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
    }

    async fn get(&self, entity_id: &EntityId) -> Result<Option<EntityRecord>, AppError> {
        let row = sqlx::query(SELECT_RECORD_BY_ID)
            .bind(entity_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_record_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn apply_patch(
        &self,
        entity_id: &EntityId,
        fields: &Map<String, Value>,
        updated_by: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        let row = sqlx::query(SELECT_RECORD_FIELDS)
            .bind(entity_id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(AppError::NotFound(format!("record {entity_id}")));
        };
        let current_json: String = row.try_get("fields")?;
        let mut document = parse_field_document(entity_id.as_str(), &current_json)?;

        // Column-backed keys route to their columns; everything else merges
        // into the field document.
        let mut container: Option<String> = None;
        let mut deleted: Option<bool> = None;
        for (name, value) in fields {
            match name.as_str() {
                CONTAINER_FIELD => match value {
                    Value::String(target) => container = Some(target.clone()),
                    other => {
                        return Err(AppError::InvalidInput(format!(
                            "containerId must be a string, got {other}"
                        )));
                    }
                },
                DELETED_FIELD => match value {
                    Value::Bool(flag) => deleted = Some(*flag),
                    other => {
                        return Err(AppError::InvalidInput(format!(
                            "deleted must be a boolean, got {other}"
                        )));
                    }
                },
                _ => {
                    document.insert(name.clone(), value.clone());
                }
            }
        }

        sqlx::query(UPDATE_RECORD_STATE)
            .bind(serde_json::to_string(&document)?)
            .bind(container)
            .bind(deleted)
            .bind(Utc::now().timestamp_millis())
            .bind(updated_by)
            .bind(entity_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

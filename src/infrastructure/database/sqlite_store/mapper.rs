use super::store_error::StoreError;
use crate::domain::entities::{ChangeType, EntityRecord, PresenceEntry, SnapshotActor, VersionSnapshot};
use crate::domain::value_objects::{ContainerId, EntityId, EntityKind, SequenceNumber};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row};
use std::collections::BTreeSet;

pub(super) fn map_record_row(row: &SqliteRow) -> Result<EntityRecord, AppError> {
    let entity_id: String = row.try_get("entity_id")?;
    let fields_json: String = row.try_get("fields")?;
    let fields = parse_field_document(&entity_id, &fields_json)?;

    Ok(EntityRecord {
        id: EntityId::new(entity_id).map_err(AppError::Internal)?,
        kind: EntityKind::new(row.try_get("entity_kind")?).map_err(AppError::Internal)?,
        container_id: ContainerId::new(row.try_get("container_id")?).map_err(AppError::Internal)?,
        fields,
        deleted: row.try_get::<i64, _>("deleted")? != 0,
        created_at: millis_to_datetime(row.try_get("created_at")?),
        updated_at: millis_to_datetime(row.try_get("updated_at")?),
        updated_by: row.try_get("updated_by")?,
    })
}

pub(super) fn map_snapshot_row(row: &SqliteRow) -> Result<VersionSnapshot, AppError> {
    let entity_id: String = row.try_get("entity_id")?;
    let captured_json: Option<String> = row.try_get("captured_fields")?;
    let captured_fields = match captured_json {
        Some(json) => Some(parse_field_document(&entity_id, &json)?),
        None => None,
    };
    let change_type: String = row.try_get("change_type")?;
    let change_type = ChangeType::parse(&change_type).map_err(|reason| StoreError::Column {
        column: "change_type".to_string(),
        reason,
    })?;

    Ok(VersionSnapshot {
        entity_id: EntityId::new(entity_id).map_err(AppError::Internal)?,
        sequence_no: SequenceNumber::new(row.try_get("sequence_no")?)
            .map_err(AppError::Internal)?,
        captured_fields,
        change_type,
        acting_user: SnapshotActor {
            id: row.try_get("actor_id")?,
            display_name: row.try_get("actor_name")?,
            avatar_url: row.try_get("actor_avatar")?,
        },
        captured_at: millis_to_datetime(row.try_get("captured_at")?),
        source: row.try_get("source")?,
    })
}

pub(super) fn map_presence_row(row: &SqliteRow) -> Result<PresenceEntry, AppError> {
    let fields_json: String = row.try_get("fields")?;
    let fields: BTreeSet<String> =
        serde_json::from_str(&fields_json).map_err(|err| StoreError::Column {
            column: "fields".to_string(),
            reason: err.to_string(),
        })?;

    Ok(PresenceEntry {
        entity_kind: EntityKind::new(row.try_get("entity_kind")?).map_err(AppError::Internal)?,
        entity_id: EntityId::new(row.try_get("entity_id")?).map_err(AppError::Internal)?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        user_avatar: row.try_get("user_avatar")?,
        fields,
        started_at: millis_to_datetime(row.try_get("started_at")?),
        last_heartbeat_at: millis_to_datetime(row.try_get("last_heartbeat_at")?),
    })
}

pub(super) fn parse_field_document(
    entity_id: &str,
    json: &str,
) -> Result<Map<String, Value>, AppError> {
    let value: Value = serde_json::from_str(json).map_err(|err| StoreError::FieldDocument {
        entity_id: entity_id.to_string(),
        reason: err.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::FieldDocument {
            entity_id: entity_id.to_string(),
            reason: format!("expected a JSON object, got {other}"),
        }
        .into()),
    }
}

pub(super) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

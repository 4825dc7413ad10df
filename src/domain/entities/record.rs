use crate::domain::value_objects::{ContainerId, EntityId, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that live as columns rather than inside the field document. Patches
/// may still address them by name; the store routes them.
pub const CONTAINER_FIELD: &str = "containerId";
pub const DELETED_FIELD: &str = "deleted";

/// The mutable business record under version control (a shot, a look, ...).
/// Mutated only through the update coordinator; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub container_id: ContainerId,
    pub fields: Map<String, Value>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl EntityRecord {
    /// Resolves a field by patch key, including the virtual column-backed
    /// keys, so pre-image capture sees the same namespace patches write to.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            CONTAINER_FIELD => Some(Value::String(self.container_id.to_string())),
            DELETED_FIELD => Some(Value::Bool(self.deleted)),
            other => self.fields.get(other).cloned(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

/// Input for creating a record. Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub id: EntityId,
    pub kind: EntityKind,
    pub container_id: ContainerId,
    pub fields: Map<String, Value>,
    pub created_by: String,
}

impl RecordDraft {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        container_id: ContainerId,
        fields: Map<String, Value>,
        created_by: String,
    ) -> Self {
        Self {
            id,
            kind,
            container_id,
            fields,
            created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> EntityRecord {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Shot 4"));
        fields.insert("notes".to_string(), json!("golden hour"));
        EntityRecord {
            id: EntityId::new("shot4".into()).unwrap(),
            kind: EntityKind::new("shot".into()).unwrap(),
            container_id: ContainerId::new("proj1".into()).unwrap(),
            fields,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            updated_by: "u1".to_string(),
        }
    }

    #[test]
    fn test_field_resolves_document_keys() {
        let record = sample_record();
        assert_eq!(record.field("title"), Some(json!("Shot 4")));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_field_resolves_virtual_keys() {
        let record = sample_record();
        assert_eq!(record.field(CONTAINER_FIELD), Some(json!("proj1")));
        assert_eq!(record.field(DELETED_FIELD), Some(json!(false)));
    }
}

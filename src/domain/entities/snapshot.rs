use crate::domain::value_objects::{EntityId, SequenceNumber, UpdateSource, UserIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "create" => Ok(ChangeType::Create),
            "update" => Ok(ChangeType::Update),
            "delete" => Ok(ChangeType::Delete),
            other => Err(format!("Unknown change type: {other}")),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Acting-user identity denormalized into each snapshot, so history stays
/// readable even if the account is later removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotActor {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl SnapshotActor {
    pub fn from_identity(user: &UserIdentity) -> Self {
        Self {
            id: user.uid.clone(),
            display_name: user.visible_name().to_string(),
            avatar_url: user.photo_url.clone(),
        }
    }
}

/// Immutable history record. `captured_fields` holds the pre-update values
/// of exactly the fields the patch changed (`None` for creations), so
/// replaying snapshots newest-first from the current state rewinds to any
/// past state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionSnapshot {
    pub entity_id: EntityId,
    pub sequence_no: SequenceNumber,
    pub captured_fields: Option<Map<String, Value>>,
    pub change_type: ChangeType,
    pub acting_user: SnapshotActor,
    pub captured_at: DateTime<Utc>,
    pub source: String,
}

/// Snapshot about to be appended. Sequence number and capture timestamp are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub entity_id: EntityId,
    pub captured_fields: Option<Map<String, Value>>,
    pub change_type: ChangeType,
    pub acting_user: SnapshotActor,
    pub source: UpdateSource,
}

impl NewSnapshot {
    pub fn new(
        entity_id: EntityId,
        captured_fields: Option<Map<String, Value>>,
        change_type: ChangeType,
        acting_user: SnapshotActor,
        source: UpdateSource,
    ) -> Self {
        Self {
            entity_id,
            captured_fields,
            change_type,
            acting_user,
            source,
        }
    }
}

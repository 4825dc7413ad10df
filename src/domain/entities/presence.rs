use crate::domain::value_objects::{EntityId, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ephemeral "currently editing" marker. At most one entry exists per
/// (entity_kind, entity_id, user_id); it is presence, not history, and is
/// gone once its heartbeat ages past the TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceEntry {
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub fields: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
}

impl PresenceEntry {
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_ms: u64) -> bool {
        let age = now.signed_duration_since(self.last_heartbeat_at);
        age.num_milliseconds() > ttl_ms as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(last_heartbeat_at: DateTime<Utc>) -> PresenceEntry {
        PresenceEntry {
            entity_kind: EntityKind::new("shot".into()).unwrap(),
            entity_id: EntityId::new("shot1".into()).unwrap(),
            user_id: "u1".to_string(),
            user_name: "Ava".to_string(),
            user_avatar: None,
            fields: BTreeSet::from(["title".to_string()]),
            started_at: last_heartbeat_at,
            last_heartbeat_at,
        }
    }

    #[test]
    fn test_is_stale_compares_against_ttl() {
        let now = Utc::now();
        assert!(!entry(now).is_stale(now, 45_000));
        assert!(entry(now - Duration::seconds(50)).is_stale(now, 45_000));
        assert!(!entry(now - Duration::seconds(40)).is_stale(now, 45_000));
    }
}

use crate::domain::entities::PresenceEntry;
use crate::domain::value_objects::{EntityId, EntityKind, SessionId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::mpsc;

/// Ephemeral presence persistence plus live observation. The session id
/// scopes refresh/replace/remove so that handles outlived by a replacement
/// or by expiry become harmless no-ops (the bool results report whether the
/// session still owned its row).
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Inserts or replaces the entry for (entity_kind, entity_id, user_id)
    /// and binds it to `session` — replace, never duplicate.
    async fn upsert(&self, entry: PresenceEntry, session: &SessionId) -> Result<(), AppError>;

    /// Refreshes the heartbeat of a still-live session.
    async fn refresh(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        session: &SessionId,
    ) -> Result<bool, AppError>;

    /// Replaces the field set and refreshes the heartbeat.
    async fn replace_fields(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        session: &SessionId,
        fields: &BTreeSet<String>,
    ) -> Result<bool, AppError>;

    async fn remove(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        session: &SessionId,
    ) -> Result<bool, AppError>;

    /// Active (non-stale) entries for one entity.
    async fn list_active<'a>(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<&'a str>,
    ) -> Result<Vec<PresenceEntry>, AppError>;

    /// Live stream of the active set: the current snapshot immediately,
    /// then a fresh full snapshot on every membership or field-set change
    /// and on sweep removals. Dropping the receiver detaches the watcher.
    async fn watch(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<String>,
    ) -> Result<mpsc::Receiver<Vec<PresenceEntry>>, AppError>;

    /// Deletes stale entries and notifies affected watchers. Returns the
    /// number of entries removed.
    async fn sweep(&self) -> Result<u32, AppError>;
}

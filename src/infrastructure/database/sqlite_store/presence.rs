use super::mapper::map_presence_row;
use super::queries::{
    DELETE_PRESENCE_BY_SESSION, DELETE_STALE_PRESENCE, REFRESH_PRESENCE, REPLACE_PRESENCE_FIELDS,
    SELECT_ACTIVE_PRESENCE, SELECT_STALE_PRESENCE_KEYS, UPSERT_PRESENCE,
};
use crate::application::ports::PresenceStore;
use crate::domain::entities::PresenceEntry;
use crate::domain::value_objects::{EntityId, EntityKind, SessionId};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::{mpsc, RwLock};

const WATCH_CHANNEL_CAPACITY: usize = 16;

struct Watcher {
    tx: mpsc::Sender<Vec<PresenceEntry>>,
    exclude_user: Option<String>,
}

/// Presence rows in SQLite plus an in-process fan-out of full-set emissions
/// to watchers. Emissions are always the complete active set, never deltas;
/// a lagging watcher loses intermediate emissions (bounded channel,
/// try_send) but catches up on the next change.
pub struct SqlitePresenceStore {
    pool: ConnectionPool,
    ttl_ms: u64,
    watchers: RwLock<HashMap<(String, String), Vec<Watcher>>>,
}

impl SqlitePresenceStore {
    pub fn new(pool: ConnectionPool, ttl_ms: u64) -> Self {
        Self {
            pool,
            ttl_ms,
            watchers: RwLock::new(HashMap::new()),
        }
    }

    fn cutoff_ms(&self) -> i64 {
        Utc::now().timestamp_millis() - self.ttl_ms as i64
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    async fn load_active(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<&str>,
    ) -> Result<Vec<PresenceEntry>, AppError> {
        let rows = sqlx::query(SELECT_ACTIVE_PRESENCE)
            .bind(entity_kind.as_str())
            .bind(entity_id.as_str())
            .bind(self.cutoff_ms())
            .bind(exclude_user)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_presence_row(&row)?);
        }
        Ok(entries)
    }

    /// Pushes a fresh snapshot to every watcher of this entity, pruning
    /// watchers whose receivers were dropped.
    async fn notify(&self, entity_kind: &EntityKind, entity_id: &EntityId) {
        let key = (entity_kind.to_string(), entity_id.to_string());
        let targets: Vec<(mpsc::Sender<Vec<PresenceEntry>>, Option<String>)> = {
            let mut watchers = self.watchers.write().await;
            let Some(list) = watchers.get_mut(&key) else {
                return;
            };
            list.retain(|watcher| !watcher.tx.is_closed());
            if list.is_empty() {
                watchers.remove(&key);
                return;
            }
            list.iter()
                .map(|watcher| (watcher.tx.clone(), watcher.exclude_user.clone()))
                .collect()
        };

        for (tx, exclude_user) in targets {
            match self
                .load_active(entity_kind, entity_id, exclude_user.as_deref())
                .await
            {
                Ok(entries) => {
                    let _ = tx.try_send(entries);
                }
                Err(err) => {
                    tracing::warn!(
                        target: "callboard::presence",
                        entity_id = %entity_id,
                        error = %err,
                        "failed to load presence set for emission"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl PresenceStore for SqlitePresenceStore {
    async fn upsert(&self, entry: PresenceEntry, session: &SessionId) -> Result<(), AppError> {
        let fields_json = serde_json::to_string(&entry.fields)?;
        sqlx::query(UPSERT_PRESENCE)
            .bind(entry.entity_kind.as_str())
            .bind(entry.entity_id.as_str())
            .bind(&entry.user_id)
            .bind(session.as_str())
            .bind(&entry.user_name)
            .bind(entry.user_avatar.as_deref())
            .bind(&fields_json)
            .bind(entry.started_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        self.notify(&entry.entity_kind, &entry.entity_id).await;
        Ok(())
    }

    async fn refresh(
        &self,
        _entity_kind: &EntityKind,
        _entity_id: &EntityId,
        session: &SessionId,
    ) -> Result<bool, AppError> {
        // The cutoff guard keeps a heartbeat from reviving an already-stale
        // entry that reads have stopped showing.
        let result = sqlx::query(REFRESH_PRESENCE)
            .bind(Self::now_ms())
            .bind(session.as_str())
            .bind(self.cutoff_ms())
            .execute(self.pool.get_pool())
            .await?;
        // Heartbeats change no visible state, so no emission.
        Ok(result.rows_affected() > 0)
    }

    async fn replace_fields(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        session: &SessionId,
        fields: &BTreeSet<String>,
    ) -> Result<bool, AppError> {
        let fields_json = serde_json::to_string(fields)?;
        let result = sqlx::query(REPLACE_PRESENCE_FIELDS)
            .bind(&fields_json)
            .bind(Self::now_ms())
            .bind(session.as_str())
            .bind(self.cutoff_ms())
            .execute(self.pool.get_pool())
            .await?;

        let changed = result.rows_affected() > 0;
        if changed {
            self.notify(entity_kind, entity_id).await;
        }
        Ok(changed)
    }

    async fn remove(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        session: &SessionId,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_PRESENCE_BY_SESSION)
            .bind(session.as_str())
            .execute(self.pool.get_pool())
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            self.notify(entity_kind, entity_id).await;
        }
        Ok(removed)
    }

    async fn list_active<'a>(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<&'a str>,
    ) -> Result<Vec<PresenceEntry>, AppError> {
        self.load_active(entity_kind, entity_id, exclude_user).await
    }

    async fn watch(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<String>,
    ) -> Result<mpsc::Receiver<Vec<PresenceEntry>>, AppError> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        let initial = self
            .load_active(entity_kind, entity_id, exclude_user.as_deref())
            .await?;
        let _ = tx.try_send(initial);

        let key = (entity_kind.to_string(), entity_id.to_string());
        let mut watchers = self.watchers.write().await;
        watchers
            .entry(key)
            .or_default()
            .push(Watcher { tx, exclude_user });

        Ok(rx)
    }

    async fn sweep(&self) -> Result<u32, AppError> {
        let cutoff = self.cutoff_ms();

        let stale_rows = sqlx::query(SELECT_STALE_PRESENCE_KEYS)
            .bind(cutoff)
            .fetch_all(self.pool.get_pool())
            .await?;
        if stale_rows.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(DELETE_STALE_PRESENCE)
            .bind(cutoff)
            .execute(self.pool.get_pool())
            .await?;

        for row in &stale_rows {
            let kind: String = row.try_get("entity_kind")?;
            let id: String = row.try_get("entity_id")?;
            let kind = EntityKind::new(kind).map_err(AppError::Internal)?;
            let id = EntityId::new(id).map_err(AppError::Internal)?;
            self.notify(&kind, &id).await;
        }

        Ok(result.rows_affected() as u32)
    }
}

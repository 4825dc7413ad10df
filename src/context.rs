use crate::application::ports::{PresenceStore, RecordStore, SnapshotStore};
use crate::application::services::{
    LifecycleService, PresenceService, UpdateService, VersionHistoryService,
};
use crate::infrastructure::database::{
    ConnectionPool, SqlitePresenceStore, SqliteRecordStore, SqliteSnapshotStore,
};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Wires pool, stores, and services together for a host application.
#[derive(Clone)]
pub struct CoreContext {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub records: Arc<dyn RecordStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub presence_store: Arc<dyn PresenceStore>,
    pub updates: Arc<UpdateService>,
    pub history: Arc<VersionHistoryService>,
    pub presence: Arc<PresenceService>,
    pub lifecycle: Arc<LifecycleService>,
}

impl CoreContext {
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ValidationError)?;
        let pool =
            ConnectionPool::new(&config.database.url, config.database.max_connections).await?;
        pool.migrate().await?;
        Ok(Self::wire(config, pool))
    }

    /// In-memory context for tests and local experiments.
    pub async fn in_memory() -> Result<Self, AppError> {
        Self::in_memory_with(AppConfig::default()).await
    }

    pub async fn in_memory_with(config: AppConfig) -> Result<Self, AppError> {
        let pool = ConnectionPool::from_memory().await?;
        pool.migrate().await?;
        Ok(Self::wire(config, pool))
    }

    fn wire(config: AppConfig, pool: ConnectionPool) -> Self {
        let records: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(pool.clone()));
        let presence_store: Arc<dyn PresenceStore> = Arc::new(SqlitePresenceStore::new(
            pool.clone(),
            config.presence.ttl_ms,
        ));

        let updates = Arc::new(UpdateService::new(records.clone(), snapshots.clone()));
        let history = Arc::new(VersionHistoryService::new(
            snapshots.clone(),
            config.history.clone(),
        ));
        let presence = Arc::new(PresenceService::new(
            presence_store.clone(),
            config.presence.clone(),
        ));
        let lifecycle = Arc::new(LifecycleService::new(updates.clone()));

        Self {
            config,
            pool,
            records,
            snapshots,
            presence_store,
            updates,
            history,
            presence,
            lifecycle,
        }
    }

    /// Starts the background stale-presence sweep. Abort the handle on
    /// shutdown; entries also age out lazily at read time.
    pub fn start_presence_sweeper(&self) -> JoinHandle<()> {
        self.presence.spawn_sweeper()
    }
}

use crate::application::ports::PresenceStore;
use crate::domain::entities::PresenceEntry;
use crate::domain::value_objects::{EntityId, EntityKind, SessionId, UserIdentity};
use crate::shared::config::PresenceConfig;
use crate::shared::error::AppError;
use crate::shared::metrics::PRESENCE_SWEEPS;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle returned by `begin_editing`. Heartbeats and field updates issued
/// through a handle whose session has been replaced or expired are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingSession {
    entity_kind: EntityKind,
    entity_id: EntityId,
    user_id: String,
    session_id: SessionId,
}

impl EditingSession {
    pub fn entity_kind(&self) -> &EntityKind {
        &self.entity_kind
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

pub struct PresenceService {
    store: Arc<dyn PresenceStore>,
    config: PresenceConfig,
}

impl PresenceService {
    pub fn new(store: Arc<dyn PresenceStore>, config: PresenceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Registers the user as editing the given fields. A second call for
    /// the same user on the same entity replaces the earlier entry and
    /// invalidates its handle.
    pub async fn begin_editing(
        &self,
        entity_kind: EntityKind,
        entity_id: EntityId,
        user: &UserIdentity,
        fields: BTreeSet<String>,
    ) -> Result<EditingSession, AppError> {
        if user.uid.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Acting user uid is missing".to_string(),
            ));
        }

        let session_id = SessionId::generate();
        let now = Utc::now();
        let entry = PresenceEntry {
            entity_kind: entity_kind.clone(),
            entity_id: entity_id.clone(),
            user_id: user.uid.clone(),
            user_name: user.visible_name().to_string(),
            user_avatar: user.photo_url.clone(),
            fields,
            started_at: now,
            last_heartbeat_at: now,
        };
        self.store.upsert(entry, &session_id).await?;

        Ok(EditingSession {
            entity_kind,
            entity_id,
            user_id: user.uid.clone(),
            session_id,
        })
    }

    /// Fire-and-forget: a failed heartbeat just lets the entry expire on
    /// other clients' views, so store errors are logged, never returned.
    pub async fn heartbeat(&self, session: &EditingSession) {
        match self
            .store
            .refresh(
                &session.entity_kind,
                &session.entity_id,
                &session.session_id,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(
                    target: "callboard::presence",
                    entity_id = %session.entity_id,
                    user_id = %session.user_id,
                    "heartbeat for replaced or expired session ignored"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: "callboard::presence",
                    entity_id = %session.entity_id,
                    error = %err,
                    "presence heartbeat failed"
                );
            }
        }
    }

    /// Replaces the field set (focus moved) and refreshes the heartbeat.
    /// Same non-blocking policy as `heartbeat`.
    pub async fn update_fields(&self, session: &EditingSession, fields: BTreeSet<String>) {
        match self
            .store
            .replace_fields(
                &session.entity_kind,
                &session.entity_id,
                &session.session_id,
                &fields,
            )
            .await
        {
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    target: "callboard::presence",
                    entity_id = %session.entity_id,
                    error = %err,
                    "presence field update failed"
                );
            }
        }
    }

    /// Idempotent: ending an already-ended, replaced, or expired session is
    /// a no-op.
    pub async fn end_editing(&self, session: &EditingSession) {
        if let Err(err) = self
            .store
            .remove(
                &session.entity_kind,
                &session.entity_id,
                &session.session_id,
            )
            .await
        {
            tracing::warn!(
                target: "callboard::presence",
                entity_id = %session.entity_id,
                error = %err,
                "presence removal failed; entry will expire by TTL"
            );
        }
    }

    pub async fn observe(
        &self,
        entity_kind: &EntityKind,
        entity_id: &EntityId,
        exclude_user: Option<String>,
    ) -> Result<mpsc::Receiver<Vec<PresenceEntry>>, AppError> {
        self.store.watch(entity_kind, entity_id, exclude_user).await
    }

    /// Background sweep that deletes stale entries so watchers never see an
    /// entry survive past one TTL window. Reads additionally filter by TTL,
    /// so the sweep interval only bounds notification latency.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let interval_ms = self.config.sweep_interval_ms;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match store.sweep().await {
                    Ok(removed) => {
                        PRESENCE_SWEEPS.record_success();
                        if removed > 0 {
                            tracing::debug!(
                                target: "callboard::presence",
                                removed,
                                "swept stale presence entries"
                            );
                        }
                    }
                    Err(err) => {
                        PRESENCE_SWEEPS.record_failure();
                        tracing::warn!(
                            target: "callboard::presence",
                            error = %err,
                            "presence sweep failed"
                        );
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Presence {}

        #[async_trait]
        impl PresenceStore for Presence {
            async fn upsert(&self, entry: PresenceEntry, session: &SessionId) -> Result<(), AppError>;
            async fn refresh(
                &self,
                entity_kind: &EntityKind,
                entity_id: &EntityId,
                session: &SessionId,
            ) -> Result<bool, AppError>;
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
            async fn list_active<'a>(
                &self,
                entity_kind: &EntityKind,
                entity_id: &EntityId,
                exclude_user: Option<&'a str>,
            ) -> Result<Vec<PresenceEntry>, AppError>;
            async fn watch(
                &self,
                entity_kind: &EntityKind,
                entity_id: &EntityId,
                exclude_user: Option<String>,
            ) -> Result<mpsc::Receiver<Vec<PresenceEntry>>, AppError>;
            async fn sweep(&self) -> Result<u32, AppError>;
        }
    }

    fn user() -> UserIdentity {
        UserIdentity::new("u1".into(), "Ava".into(), "ava@example.com".into(), None)
    }

    fn service(store: MockPresence) -> PresenceService {
        PresenceService::new(Arc::new(store), PresenceConfig::default())
    }

    async fn session(svc: &PresenceService) -> EditingSession {
        svc.begin_editing(
            EntityKind::new("shot".into()).unwrap(),
            EntityId::new("shot1".into()).unwrap(),
            &user(),
            BTreeSet::from(["title".to_string()]),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_begin_editing_rejects_blank_uid() {
        let store = MockPresence::new();
        let svc = service(store);
        let blank = UserIdentity::new("".into(), "Ava".into(), String::new(), None);
        let result = svc
            .begin_editing(
                EntityKind::new("shot".into()).unwrap(),
                EntityId::new("shot1".into()).unwrap(),
                &blank,
                BTreeSet::new(),
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_heartbeat_swallows_store_errors() {
        let mut store = MockPresence::new();
        store.expect_upsert().times(1).returning(|_, _| Ok(()));
        store
            .expect_refresh()
            .times(1)
            .returning(|_, _, _| Err(AppError::Database("down".into())));

        let svc = service(store);
        let session = session(&svc).await;
        // Must not panic or propagate.
        svc.heartbeat(&session).await;
    }

    #[tokio::test]
    async fn test_end_editing_is_idempotent() {
        let mut store = MockPresence::new();
        store.expect_upsert().times(1).returning(|_, _| Ok(()));
        store
            .expect_remove()
            .times(2)
            .returning(|_, _, _| Ok(false));

        let svc = service(store);
        let session = session(&svc).await;
        svc.end_editing(&session).await;
        svc.end_editing(&session).await;
    }

    #[tokio::test]
    async fn test_begin_editing_uses_visible_name_and_fields() {
        let mut store = MockPresence::new();
        store
            .expect_upsert()
            .withf(|entry, _| {
                entry.user_name == "Ava" && entry.fields == BTreeSet::from(["title".to_string()])
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(store);
        let session = session(&svc).await;
        assert_eq!(session.user_id(), "u1");
    }
}

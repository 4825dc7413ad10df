pub mod application;
pub mod context;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{PresenceStore, RecordStore, SnapshotStore};
pub use application::services::presence_summary;
pub use application::services::{
    CopyOutcome, DuplicateOutcome, EditingSession, FieldLabels, LifecycleService, PresenceService,
    UpdateService, UpdateServiceTrait, VersionHistoryService,
};
pub use context::CoreContext;
pub use domain::entities::{
    ChangeType, EntityRecord, NewSnapshot, PresenceEntry, RecordDraft, SnapshotActor,
    VersionSnapshot,
};
pub use domain::value_objects::{
    ContainerId, EntityId, EntityKind, Patch, PatchValue, SequenceNumber, SessionId, UpdateSource,
    UserIdentity,
};
pub use shared::config::AppConfig;
pub use shared::error::{AppError, Result};

/// Host-facing logging setup. Hosts embedding the core into a larger
/// application will usually install their own subscriber instead.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callboard=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub mod presence_store;
pub mod record_store;
pub mod snapshot_store;

pub use presence_store::PresenceStore;
pub use record_store::RecordStore;
pub use snapshot_store::SnapshotStore;

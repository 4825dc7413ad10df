mod mapper;
mod presence;
mod queries;
mod records;
mod snapshots;
mod store_error;

pub use presence::SqlitePresenceStore;
pub use records::SqliteRecordStore;
pub use snapshots::SqliteSnapshotStore;
pub use store_error::StoreError;

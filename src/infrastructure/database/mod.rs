pub mod connection_pool;
pub mod sqlite_store;

pub use connection_pool::ConnectionPool;
pub use sqlite_store::{SqlitePresenceStore, SqliteRecordStore, SqliteSnapshotStore};

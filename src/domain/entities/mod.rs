pub mod presence;
pub mod record;
pub mod snapshot;

pub use presence::PresenceEntry;
pub use record::{EntityRecord, RecordDraft};
pub use snapshot::{ChangeType, NewSnapshot, SnapshotActor, VersionSnapshot};

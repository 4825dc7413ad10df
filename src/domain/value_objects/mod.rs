pub mod container_id;
pub mod entity_id;
pub mod entity_kind;
pub mod patch;
pub mod sequence_number;
pub mod session_id;
pub mod update_source;
pub mod user_identity;

pub use container_id::ContainerId;
pub use entity_id::EntityId;
pub use entity_kind::EntityKind;
pub use patch::{Patch, PatchValue};
pub use sequence_number::SequenceNumber;
pub use session_id::SessionId;
pub use update_source::UpdateSource;
pub use user_identity::UserIdentity;

#![allow(unused_imports)]

pub mod entities;
pub mod value_objects;

pub use entities::{
    ChangeType, EntityRecord, NewSnapshot, PresenceEntry, RecordDraft, SnapshotActor,
    VersionSnapshot,
};
pub use value_objects::{
    ContainerId, EntityId, EntityKind, Patch, PatchValue, SequenceNumber, SessionId, UpdateSource,
    UserIdentity,
};

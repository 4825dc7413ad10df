pub mod ports;
pub mod services;

pub use services::{
    EditingSession, FieldLabels, LifecycleService, PresenceService, UpdateService,
    UpdateServiceTrait, VersionHistoryService,
};

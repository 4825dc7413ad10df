pub mod history_service;
pub mod lifecycle_service;
pub mod presence_service;
pub mod presence_summary;
pub mod update_service;

pub use history_service::VersionHistoryService;
pub use lifecycle_service::{CopyOutcome, DuplicateOutcome, LifecycleService};
pub use presence_service::{EditingSession, PresenceService};
pub use presence_summary::FieldLabels;
pub use update_service::{UpdateService, UpdateServiceTrait};

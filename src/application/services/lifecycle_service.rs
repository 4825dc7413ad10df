use crate::application::services::update_service::UpdateServiceTrait;
use crate::domain::entities::record::CONTAINER_FIELD;
use crate::domain::entities::EntityRecord;
use crate::domain::value_objects::{ContainerId, EntityId, Patch, UpdateSource, UserIdentity};
use crate::shared::error::AppError;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

const TITLE_FIELD: &str = "title";
/// Manual ordering key within a container; reset on copy so the new record
/// falls to the host's default ordering.
const ORDER_FIELD: &str = "sortOrder";
/// Human-facing sequence number. Never copied: the numbering backfill must
/// treat a copied record as never-assigned.
const SHOT_NUMBER_FIELD: &str = "shotNumber";

const FALLBACK_TITLE: &str = "Untitled";

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateOutcome {
    pub entity_id: EntityId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyOutcome {
    pub entity_id: EntityId,
    pub title: String,
}

/// Structural operations built from the update coordinator's primitives.
/// Unlike snapshot appends, every failure here propagates to the caller
/// with operation context: these are user-visible structural actions.
pub struct LifecycleService {
    updates: Arc<dyn UpdateServiceTrait>,
}

impl LifecycleService {
    pub fn new(updates: Arc<dyn UpdateServiceTrait>) -> Self {
        Self { updates }
    }

    /// New entity in the same container, title disambiguated against
    /// `existing_titles` ("X", "X (2)", "X (3)", ...). Starts a fresh
    /// version history.
    pub async fn duplicate(
        &self,
        source: &EntityRecord,
        acting_user: &UserIdentity,
        existing_titles: &HashSet<String>,
    ) -> Result<DuplicateOutcome, AppError> {
        let title = resolve_title(
            source.title().unwrap_or(FALLBACK_TITLE),
            existing_titles,
        );
        let fields = copied_fields(source, &title);
        let entity_id = EntityId::generate();

        let record = self
            .updates
            .apply_create(
                entity_id,
                source.kind.clone(),
                source.container_id.clone(),
                Patch::from_fields(fields),
                acting_user.clone(),
                lifecycle_source("duplicate"),
            )
            .await
            .map_err(|err| err.with_context(&format!("duplicate failed for entity {}", source.id)))?;

        Ok(DuplicateOutcome {
            entity_id: record.id,
            title,
        })
    }

    /// Same copy rules as `duplicate` but into another container. Titles
    /// are not disambiguated: container namespaces are independent. The
    /// source record is untouched.
    pub async fn copy_to_container(
        &self,
        source: &EntityRecord,
        target_container: &ContainerId,
        acting_user: &UserIdentity,
    ) -> Result<CopyOutcome, AppError> {
        let title = source.title().unwrap_or(FALLBACK_TITLE).to_string();
        let fields = copied_fields(source, &title);
        let entity_id = EntityId::generate();

        let record = self
            .updates
            .apply_create(
                entity_id,
                source.kind.clone(),
                target_container.clone(),
                Patch::from_fields(fields),
                acting_user.clone(),
                lifecycle_source("copy"),
            )
            .await
            .map_err(|err| err.with_context(&format!("copy failed for entity {}", source.id)))?;

        Ok(CopyOutcome {
            entity_id: record.id,
            title,
        })
    }

    /// Rewrites `containerId` in place as an update, not a create, so the
    /// entity keeps its id and its full version history across the move.
    pub async fn move_to_container(
        &self,
        entity_id: &EntityId,
        current: &EntityRecord,
        target_container: &ContainerId,
        acting_user: &UserIdentity,
    ) -> Result<(), AppError> {
        let patch = Patch::new().set(CONTAINER_FIELD, target_container.to_string());
        self.updates
            .apply(
                entity_id.clone(),
                current.clone(),
                patch,
                acting_user.clone(),
                lifecycle_source("move"),
            )
            .await
            .map_err(|err| err.with_context(&format!("move failed for entity {entity_id}")))
    }

    /// Tombstones the entity. It stays readable by direct id lookup for
    /// audit; excluding it from active listings is the callers' duty.
    pub async fn soft_delete(
        &self,
        entity_id: &EntityId,
        current: &EntityRecord,
        acting_user: &UserIdentity,
    ) -> Result<(), AppError> {
        self.updates
            .apply_delete(
                entity_id.clone(),
                current.clone(),
                acting_user.clone(),
                lifecycle_source("delete"),
            )
            .await
            .map_err(|err| err.with_context(&format!("delete failed for entity {entity_id}")))
    }
}

fn lifecycle_source(operation: &str) -> UpdateSource {
    UpdateSource::new(format!("lifecycle::{operation}"))
        .unwrap_or_else(|_| unreachable!("lifecycle source labels are never empty"))
}

fn copied_fields(source: &EntityRecord, title: &str) -> Map<String, Value> {
    let mut fields = source.fields.clone();
    fields.insert(TITLE_FIELD.to_string(), Value::String(title.to_string()));
    fields.insert(ORDER_FIELD.to_string(), Value::Null);
    fields.remove(SHOT_NUMBER_FIELD);
    fields
}

fn resolve_title(base: &str, existing_titles: &HashSet<String>) -> String {
    if !existing_titles.contains(base) {
        return base.to_string();
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base} ({suffix})");
        if !existing_titles.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type within the tracking app (e.g. "shot", "look", "product").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKind(String);

impl EntityKind {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Entity kind cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityKind> for String {
    fn from(value: EntityKind) -> Self {
        value.0
    }
}

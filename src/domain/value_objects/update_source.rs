use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-text label identifying which surface or operation issued an update,
/// recorded on every snapshot for audit traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSource(String);

impl UpdateSource {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Update source cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UpdateSource> for String {
    fn from(value: UpdateSource) -> Self {
        value.0
    }
}

use serde::{Deserialize, Serialize};

/// Acting user as supplied by the host's identity provider. The core only
/// denormalizes these fields into snapshots and presence rows; it never
/// validates them beyond the uid being present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn new(
        uid: String,
        display_name: String,
        email: String,
        photo_url: Option<String>,
    ) -> Self {
        Self {
            uid,
            display_name,
            email,
            photo_url,
        }
    }

    /// Name shown in history and presence when the profile has no display
    /// name set.
    pub fn visible_name(&self) -> &str {
        if !self.display_name.trim().is_empty() {
            &self.display_name
        } else if !self.email.trim().is_empty() {
            &self.email
        } else {
            &self.uid
        }
    }
}

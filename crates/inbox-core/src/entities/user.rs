//! User profile - the public identity shown next to a conversation

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image: None,
        }
    }

    /// Set the avatar image URL
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Profile used when the user store has no record for an id
    pub fn placeholder(id: &UserId) -> Self {
        Self::new(id.clone(), id.as_str())
    }
}

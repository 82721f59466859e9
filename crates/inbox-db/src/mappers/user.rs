//! User profile entity <-> model mapper

use inbox_core::entities::UserProfile;
use inbox_core::value_objects::UserId;

use crate::models::UserModel;

impl From<UserModel> for UserProfile {
    fn from(model: UserModel) -> Self {
        UserProfile {
            id: UserId::new(model.id),
            name: model.name,
            image: model.image,
        }
    }
}

/// Borrowed column values for upserting a user row
pub struct UserInsert<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub image: Option<&'a str>,
}

impl<'a> UserInsert<'a> {
    pub fn new(profile: &'a UserProfile) -> Self {
        Self {
            id: profile.id.as_str(),
            name: &profile.name,
            image: profile.image.as_deref(),
        }
    }
}

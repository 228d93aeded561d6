use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserModel {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters long"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(url(message = "Invalid image url"))]
    pub image_url: Option<String>,
}

pub struct InsertUser {
    pub external_id: String,
    pub username: String,
    pub normalized_username: String,
    pub email: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            image_url: entity.image_url,
        }
    }
}

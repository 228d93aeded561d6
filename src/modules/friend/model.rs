use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::user::model::UserResponse;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRequestByEmail {
    #[validate(length(max = 320, message = "Email is too long"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRequestByUsername {
    #[validate(length(max = 64, message = "Username is too long"))]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithSender {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sender: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendResponse {
    pub conversation_id: Uuid,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedRequest {
    pub conversation_id: Uuid,
    pub friendship_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub conversation_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

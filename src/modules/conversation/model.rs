use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::{conversation::schema::ConversationEntity, user::schema::UserEntity};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupModel {
    #[validate(length(min = 1, max = 100, message = "Group name must be 1-100 characters long"))]
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGroupNameModel {
    #[validate(length(min = 1, max = 100, message = "Group name must be 1-100 characters long"))]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGroupImageModel {
    #[validate(url(message = "Invalid image url"))]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersModel {
    #[validate(length(min = 1, message = "At least one member is required"))]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadModel {
    pub message_id: Uuid,
}

/// Insert payload for a group; `member_ids` already contains the creator.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub creator_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub is_group: bool,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub creator_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ConversationEntity> for ConversationResponse {
    fn from(entity: ConversationEntity) -> Self {
        ConversationResponse {
            id: entity.id,
            is_group: entity.is_group,
            name: entity.name,
            image_url: entity.image_url,
            creator_id: entity.creator_id,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: Uuid,
    pub username: String,
    pub image_url: Option<String>,
}

impl From<&UserEntity> for MemberInfo {
    fn from(user: &UserEntity) -> Self {
        MemberInfo { id: user.id, username: user.username.clone(), image_url: user.image_url.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessagePreview {
    pub sender: Option<String>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation: ConversationResponse,
    pub other_member: Option<MemberInfo>,
    pub group_members: Option<Vec<String>>,
    pub last_message: Option<LastMessagePreview>,
    pub unread_count: i64,
    /// Millis of the last message, 0 when there is none.
    pub last_activity: i64,
}

/// Result of assembling one row of a fan-out read. A failed row does not fail
/// its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome<T> {
    Ok { item: T },
    #[serde(rename_all = "camelCase")]
    Failed { conversation_id: Uuid, reason: String },
}

impl<T> ItemOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ItemOutcome::Ok { item } => Some(item),
            ItemOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    pub conversation: ConversationResponse,
    pub other_member: Option<MemberInfo>,
    pub members: Vec<MemberInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersResponse {
    pub success: bool,
    pub added_count: u64,
}

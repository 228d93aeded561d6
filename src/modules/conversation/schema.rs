use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ConversationEntity {
    pub id: Uuid,
    pub is_group: bool,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub creator_id: Option<Uuid>,
    pub last_message_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MemberEntity {
    pub conversation_id: Uuid,
    pub member_id: Uuid,
    pub last_seen_message_id: Option<Uuid>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::message::schema::{MessageEntity, MessageType};

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub _type: MessageType,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageModel {
    pub conversation_id: Uuid,
    #[serde(rename = "type")]
    pub _type: MessageType,
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters long"))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithSender {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: Option<String>,
    pub sender_image: Option<String>,
    #[serde(rename = "type")]
    pub _type: MessageType,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedId {
    pub id: Uuid,
}

/// Text shown in conversation lists for a message.
pub fn preview_text(message: &MessageEntity) -> String {
    match message._type {
        MessageType::Text => message.content.clone(),
        MessageType::Image => "[Image]".to_string(),
        _ => "[Document]".to_string(),
    }
}

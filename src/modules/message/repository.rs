use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{model::InsertMessage, schema::MessageEntity},
};

#[async_trait::async_trait]
pub trait MessageRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MessageEntity>, error::SystemError>;

    /// Newest first.
    async fn find_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;

    /// Inserts the message and points the conversation's `last_message_id` at it,
    /// in one transaction.
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    /// Messages newer than `last_seen_message_id` that `user_id` did not send.
    /// Everything not sent by the user counts when there is no marker.
    async fn count_unread(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        last_seen_message_id: Option<Uuid>,
    ) -> Result<i64, error::SystemError>;
}

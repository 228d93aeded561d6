use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::repository::ConversationRepository,
        message::{
            model::{InsertMessage, MessageWithSender, SendMessageModel},
            repository::MessageRepository,
        },
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct MessageService<M, C, U>
where
    M: MessageRepository + Send + Sync + 'static,
    C: ConversationRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    message_repo: Arc<M>,
    conversation_repo: Arc<C>,
    user_repo: Arc<U>,
}

impl<M, C, U> MessageService<M, C, U>
where
    M: MessageRepository + Send + Sync + 'static,
    C: ConversationRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn with_dependencies(
        message_repo: Arc<M>,
        conversation_repo: Arc<C>,
        user_repo: Arc<U>,
    ) -> Self {
        MessageService { message_repo, conversation_repo, user_repo }
    }

    async fn ensure_member(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        if self.conversation_repo.find_membership(conversation_id, user_id).await?.is_none() {
            return Err(error::SystemError::forbidden("You are not a member of this conversation"));
        }
        Ok(())
    }

    pub async fn get_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageWithSender>, error::SystemError> {
        self.ensure_member(&conversation_id, &user_id).await?;

        let messages = self.message_repo.find_by_conversation(&conversation_id).await?;

        let mut sender_ids: Vec<Uuid> = messages.iter().map(|m| m.sender_id).collect();
        sender_ids.sort();
        sender_ids.dedup();
        let senders: HashMap<_, _> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let result = messages
            .into_iter()
            .map(|m| {
                let sender = senders.get(&m.sender_id);
                MessageWithSender {
                    id: m.id,
                    conversation_id: m.conversation_id,
                    sender_id: m.sender_id,
                    sender_username: sender.map(|u| u.username.clone()),
                    sender_image: sender.and_then(|u| u.image_url.clone()),
                    _type: m._type,
                    content: m.content,
                    created_at: m.created_at,
                    is_current_user: m.sender_id == user_id,
                }
            })
            .collect();

        Ok(result)
    }

    pub async fn send_message(
        &self,
        user_id: Uuid,
        input: SendMessageModel,
    ) -> Result<Uuid, error::SystemError> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(error::SystemError::bad_request("Message cannot be empty"));
        }

        self.ensure_member(&input.conversation_id, &user_id).await?;

        let message = self
            .message_repo
            .create(&InsertMessage {
                conversation_id: input.conversation_id,
                sender_id: user_id,
                _type: input._type,
                content: content.to_string(),
            })
            .await?;

        Ok(message.id)
    }
}

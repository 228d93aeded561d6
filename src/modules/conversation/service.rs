use futures_util::future::join_all;
use log::{info, warn};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::{
            model::{
                AddMembersResponse, ConversationDetail, ConversationResponse, ConversationSummary,
                CreateGroupModel, ItemOutcome, LastMessagePreview, MemberInfo, NewGroup,
            },
            repository::ConversationRepository,
            schema::{ConversationEntity, MemberEntity},
        },
        message::{model::preview_text, repository::MessageRepository, schema::MessageEntity},
        user::{repository::UserRepository, schema::UserEntity},
    },
};

const MAX_GROUP_NAME: usize = 100;

#[derive(Clone)]
pub struct ConversationService<C, M, U>
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    conversation_repo: Arc<C>,
    message_repo: Arc<M>,
    user_repo: Arc<U>,
}

fn dedup(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

fn group_name(raw: &str) -> Result<String, error::SystemError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(error::SystemError::bad_request("Group name cannot be empty"));
    }
    if name.chars().count() > MAX_GROUP_NAME {
        return Err(error::SystemError::bad_request("Group name must be 1-100 characters long"));
    }
    Ok(name.to_string())
}

fn ensure_creator(
    conversation: &ConversationEntity,
    user_id: Uuid,
    action: &str,
) -> Result<(), error::SystemError> {
    if conversation.creator_id != Some(user_id) {
        return Err(error::SystemError::forbidden(format!("Only the group creator can {action}")));
    }
    Ok(())
}

fn by_id(users: Vec<UserEntity>) -> HashMap<Uuid, UserEntity> {
    users.into_iter().map(|u| (u.id, u)).collect()
}

impl<C, M, U> ConversationService<C, M, U>
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn with_dependencies(
        conversation_repo: Arc<C>,
        message_repo: Arc<M>,
        user_repo: Arc<U>,
    ) -> Self {
        ConversationService { conversation_repo, message_repo, user_repo }
    }

    async fn load_group(
        &self,
        conversation_id: Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        let conversation = self
            .conversation_repo
            .find_by_id(&conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        if !conversation.is_group {
            return Err(error::SystemError::bad_request("This conversation is not a group"));
        }

        Ok(conversation)
    }

    async fn ensure_users_exist(&self, ids: &[Uuid]) -> Result<(), error::SystemError> {
        let found = self.user_repo.find_by_ids(ids).await?;
        if found.len() < ids.len() {
            return Err(error::SystemError::not_found("User not found"));
        }
        Ok(())
    }

    async fn load_entry(
        &self,
        conversation_id: Uuid,
    ) -> Result<(ConversationEntity, Option<MessageEntity>), error::SystemError> {
        let conversation = self
            .conversation_repo
            .find_by_id(&conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        let last_message = match conversation.last_message_id {
            Some(message_id) => match self.message_repo.find_by_id(&message_id).await {
                Ok(message) => message,
                Err(e) => {
                    warn!("Last message {} of {} unavailable: {:?}", message_id, conversation.id, e);
                    None
                }
            },
            None => None,
        };

        Ok((conversation, last_message))
    }

    async fn summarize(
        &self,
        user_id: Uuid,
        membership: &MemberEntity,
        conversation: ConversationEntity,
        last_message: Option<MessageEntity>,
        last_activity: i64,
    ) -> Result<ConversationSummary, error::SystemError> {
        let (members, unread_count) = tokio::try_join!(
            self.conversation_repo.find_members(&conversation.id),
            self.message_repo.count_unread(
                &conversation.id,
                &user_id,
                membership.last_seen_message_id
            ),
        )?;

        let mut ids: Vec<Uuid> = members.iter().map(|m| m.member_id).collect();
        if let Some(message) = &last_message {
            if !ids.contains(&message.sender_id) {
                ids.push(message.sender_id);
            }
        }
        let users = by_id(self.user_repo.find_by_ids(&ids).await?);

        let (other_member, group_members) = if conversation.is_group {
            let usernames = members
                .iter()
                .filter_map(|m| users.get(&m.member_id))
                .map(|u| u.username.clone())
                .collect();
            (None, Some(usernames))
        } else {
            let other = members
                .iter()
                .find(|m| m.member_id != user_id)
                .and_then(|m| users.get(&m.member_id))
                .map(MemberInfo::from);
            (other, None)
        };

        let last_message = last_message.map(|message| LastMessagePreview {
            sender: users.get(&message.sender_id).map(|u| u.username.clone()),
            content: preview_text(&message),
            created_at: message.created_at,
        });

        Ok(ConversationSummary {
            conversation: ConversationResponse::from(conversation),
            other_member,
            group_members,
            last_message,
            unread_count,
            last_activity,
        })
    }

    /// Every conversation the user belongs to, most recently active first.
    /// A row that cannot be assembled comes back as `ItemOutcome::Failed`; a
    /// failed membership scan yields an empty list.
    pub async fn get_conversations(&self, user_id: Uuid) -> Vec<ItemOutcome<ConversationSummary>> {
        let memberships = match self.conversation_repo.find_memberships_by_user(&user_id).await {
            Ok(memberships) => memberships,
            Err(e) => {
                warn!("Failed to load memberships for {}: {:?}", user_id, e);
                return Vec::new();
            }
        };

        let mut entries = join_all(memberships.into_iter().map(|membership| async move {
            let loaded = self.load_entry(membership.conversation_id).await;
            let last_activity = match &loaded {
                Ok((_, Some(message))) => message.created_at.timestamp_millis(),
                _ => 0,
            };
            (last_activity, membership, loaded)
        }))
        .await;

        // stable: equal keys keep membership order
        entries.sort_by(|a, b| b.0.cmp(&a.0));

        join_all(entries.into_iter().map(|(last_activity, membership, loaded)| async move {
            let conversation_id = membership.conversation_id;
            let summary = match loaded {
                Ok((conversation, last_message)) => {
                    self.summarize(user_id, &membership, conversation, last_message, last_activity)
                        .await
                }
                Err(e) => Err(e),
            };

            match summary {
                Ok(item) => ItemOutcome::Ok { item },
                Err(e) => {
                    warn!("Conversation {} skipped for {}: {:?}", conversation_id, user_id, e);
                    ItemOutcome::Failed { conversation_id, reason: e.to_string() }
                }
            }
        }))
        .await
    }

    pub async fn get_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<ConversationDetail, error::SystemError> {
        let (conversation, membership) = tokio::try_join!(
            self.conversation_repo.find_by_id(&conversation_id),
            self.conversation_repo.find_membership(&conversation_id, &user_id),
        )?;

        let conversation =
            conversation.ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;
        if membership.is_none() {
            return Err(error::SystemError::forbidden("You are not a member of this conversation"));
        }

        let members = self.conversation_repo.find_members(&conversation_id).await?;
        let ids: Vec<Uuid> = members.iter().map(|m| m.member_id).collect();
        let users = by_id(self.user_repo.find_by_ids(&ids).await?);

        let members: Vec<MemberInfo> =
            ids.iter().filter_map(|id| users.get(id)).map(MemberInfo::from).collect();
        let other_member = if conversation.is_group {
            None
        } else {
            members.iter().find(|m| m.id != user_id).cloned()
        };

        Ok(ConversationDetail {
            conversation: ConversationResponse::from(conversation),
            other_member,
            members,
        })
    }

    pub async fn create_group(
        &self,
        creator_id: Uuid,
        input: CreateGroupModel,
    ) -> Result<Uuid, error::SystemError> {
        let name = group_name(&input.name)?;
        let member_ids = dedup(std::iter::once(creator_id).chain(input.member_ids));

        self.ensure_users_exist(&member_ids).await?;

        let conversation = self
            .conversation_repo
            .create_group(&NewGroup { name, creator_id, member_ids })
            .await?;

        info!("Group {} created by {}", conversation.id, creator_id);
        Ok(conversation.id)
    }

    pub async fn is_group_creator(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        let conversation = self.conversation_repo.find_by_id(&conversation_id).await?;
        Ok(conversation.is_some_and(|c| c.is_group && c.creator_id == Some(user_id)))
    }

    pub async fn update_group_name(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        value: &str,
    ) -> Result<(), error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        ensure_creator(&conversation, user_id, "update the group name")?;

        let name = group_name(value)?;
        self.conversation_repo.update_name(&conversation_id, &name).await
    }

    pub async fn update_group_image(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        value: &str,
    ) -> Result<(), error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        ensure_creator(&conversation, user_id, "update the group image")?;

        self.conversation_repo.update_image(&conversation_id, value.trim()).await
    }

    pub async fn add_group_members(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        member_ids: Vec<Uuid>,
    ) -> Result<AddMembersResponse, error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        ensure_creator(&conversation, user_id, "add members")?;

        let requested = dedup(member_ids);
        self.ensure_users_exist(&requested).await?;

        let existing = self.conversation_repo.find_members(&conversation_id).await?;
        let new_ids: Vec<Uuid> = requested
            .into_iter()
            .filter(|id| !existing.iter().any(|m| m.member_id == *id))
            .collect();

        let added_count = if new_ids.is_empty() {
            0
        } else {
            self.conversation_repo.add_members(&conversation_id, &new_ids).await?
        };

        Ok(AddMembersResponse { success: true, added_count })
    }

    pub async fn remove_group_member(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        ensure_creator(&conversation, user_id, "remove members")?;

        if conversation.creator_id == Some(member_id) {
            return Err(error::SystemError::bad_request("Cannot remove the group creator"));
        }

        if !self.conversation_repo.delete_member(&conversation_id, &member_id).await? {
            return Err(error::SystemError::not_found("User is not a member of this group"));
        }

        Ok(())
    }

    /// The creator hands the group to the earliest-joined remaining member, or
    /// deletes it when nobody is left.
    pub async fn leave_group(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        let members = self.conversation_repo.find_members(&conversation_id).await?;

        if !members.iter().any(|m| m.member_id == user_id) {
            return Err(error::SystemError::not_found("User is not a member of this group"));
        }

        if conversation.creator_id != Some(user_id) {
            self.conversation_repo.delete_member(&conversation_id, &user_id).await?;
            return Ok(());
        }

        let successor = members
            .iter()
            .filter(|m| m.member_id != user_id)
            .min_by_key(|m| (m.joined_at, m.member_id));

        match successor {
            Some(next) => {
                self.conversation_repo
                    .transfer_creator_and_remove(&conversation_id, &user_id, &next.member_id)
                    .await?;
                info!("Group {} handed from {} to {}", conversation_id, user_id, next.member_id);
            }
            None => {
                self.conversation_repo.delete_cascade(&conversation_id).await?;
                info!("Group {} deleted after its last member left", conversation_id);
            }
        }

        Ok(())
    }

    pub async fn delete_group(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let conversation = self.load_group(conversation_id).await?;
        ensure_creator(&conversation, user_id, "delete the group")?;

        self.conversation_repo.delete_cascade(&conversation_id).await?;
        info!("Group {} deleted by {}", conversation_id, user_id);
        Ok(())
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), error::SystemError> {
        if self.conversation_repo.find_membership(&conversation_id, &user_id).await?.is_none() {
            return Err(error::SystemError::forbidden("You are not a member of this conversation"));
        }

        let message = self
            .message_repo
            .find_by_id(&message_id)
            .await?
            .filter(|m| m.conversation_id == conversation_id)
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        self.conversation_repo.update_last_seen(&conversation_id, &user_id, &message.id).await
    }
}

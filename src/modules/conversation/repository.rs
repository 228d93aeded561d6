use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::NewGroup,
        schema::{ConversationEntity, MemberEntity},
    },
};

#[async_trait::async_trait]
pub trait ConversationRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    async fn find_memberships_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError>;

    /// Members ordered by `joined_at`, then `member_id`.
    async fn find_members(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError>;

    async fn find_membership(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<MemberEntity>, error::SystemError>;

    /// Conversation row plus one membership per id, in one transaction.
    async fn create_group(&self, group: &NewGroup)
    -> Result<ConversationEntity, error::SystemError>;

    async fn update_name(&self, conversation_id: &Uuid, name: &str)
    -> Result<(), error::SystemError>;

    async fn update_image(
        &self,
        conversation_id: &Uuid,
        image_url: &str,
    ) -> Result<(), error::SystemError>;

    /// Returns how many memberships were inserted; existing pairs are skipped.
    async fn add_members(
        &self,
        conversation_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<u64, error::SystemError>;

    async fn delete_member(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    /// Moves creatorship to `new_creator` and drops the leaver's membership atomically.
    async fn transfer_creator_and_remove(
        &self,
        conversation_id: &Uuid,
        leaver_id: &Uuid,
        new_creator_id: &Uuid,
    ) -> Result<(), error::SystemError>;

    /// Deletes messages, memberships and the conversation atomically.
    async fn delete_cascade(&self, conversation_id: &Uuid) -> Result<(), error::SystemError>;

    async fn update_last_seen(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
        message_id: &Uuid,
    ) -> Result<(), error::SystemError>;
}

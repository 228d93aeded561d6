use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::AcceptedRequest;
use crate::modules::friend::schema::{FriendshipEntity, RequestEntity};

#[async_trait::async_trait]
pub trait FriendRepository {
    /// Order of the two ids does not matter.
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    async fn find_friendship_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    async fn find_friendships(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// Directed lookup: only `sender_id -> receiver_id` matches.
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError>;

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError>;

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RequestEntity>, error::SystemError>;

    async fn count_requests_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError>;

    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestEntity, error::SystemError>;

    async fn delete_request(&self, request_id: &Uuid) -> Result<(), error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendRepository + FriendRequestRepository + Send + Sync {
    /// Direct conversation, friendship, both memberships and the request
    /// deletion as one unit.
    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<AcceptedRequest, error::SystemError>;

    /// Friendship plus its direct conversation, memberships and messages.
    async fn remove_friendship_atomic(
        &self,
        friendship: &FriendshipEntity,
    ) -> Result<(), error::SystemError>;
}

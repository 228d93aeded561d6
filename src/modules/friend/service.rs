use log::{info, warn};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendResponse, RequestWithSender},
            repository::FriendRepo,
        },
        user::{model::UserResponse, repository::UserRepository, schema::UserEntity},
    },
    utils::normalize_username,
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    pub async fn get_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RequestWithSender>, error::SystemError> {
        let requests = self.friend_repo.find_requests_to_user(&user_id).await?;

        let sender_ids: Vec<Uuid> = requests.iter().map(|r| r.sender_id).collect();
        let senders: HashMap<Uuid, UserEntity> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let result = requests
            .into_iter()
            .filter_map(|request| {
                let sender = match senders.get(&request.sender_id) {
                    Some(sender) => sender.clone(),
                    None => {
                        warn!("Request {} skipped: sender {} missing", request.id, request.sender_id);
                        return None;
                    }
                };
                Some(RequestWithSender {
                    id: request.id,
                    created_at: request.created_at,
                    sender: UserResponse::from(sender),
                })
            })
            .collect();

        Ok(result)
    }

    pub async fn count_requests(&self, user_id: Uuid) -> Result<i64, error::SystemError> {
        self.friend_repo.count_requests_to_user(&user_id).await
    }

    /// `auth_email` is the address asserted by the identity provider, checked
    /// alongside the stored one.
    pub async fn create_by_email(
        &self,
        caller: &UserEntity,
        auth_email: Option<&str>,
        email: &str,
    ) -> Result<Uuid, error::SystemError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(error::SystemError::bad_request("Email is required"));
        }

        let is_self = email.eq_ignore_ascii_case(&caller.email)
            || auth_email.is_some_and(|own| email.eq_ignore_ascii_case(own.trim()));
        if is_self {
            return Err(error::SystemError::bad_request("You cannot send a request to yourself"));
        }

        let receiver = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        self.create_checked(caller.id, &receiver).await
    }

    /// Matches through the normalized index; among users sharing a normalized
    /// name an exact case-insensitive match wins, then the oldest account.
    pub async fn create_by_username(
        &self,
        caller: &UserEntity,
        username: &str,
    ) -> Result<Uuid, error::SystemError> {
        let username = username.trim();
        let normalized = normalize_username(username);
        if normalized.is_empty() {
            return Err(error::SystemError::bad_request("Username is required"));
        }

        let candidates = self.user_repo.find_by_normalized_username(&normalized).await?;
        let wanted = username.to_lowercase();
        let receiver = candidates
            .iter()
            .find(|u| u.username.to_lowercase() == wanted)
            .or_else(|| candidates.first())
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        self.create_checked(caller.id, receiver).await
    }

    async fn create_checked(
        &self,
        sender_id: Uuid,
        receiver: &UserEntity,
    ) -> Result<Uuid, error::SystemError> {
        if receiver.id == sender_id {
            return Err(error::SystemError::bad_request("You cannot send a request to yourself"));
        }

        let (outgoing, incoming, friendship) = tokio::try_join!(
            self.friend_repo.find_request(&sender_id, &receiver.id),
            self.friend_repo.find_request(&receiver.id, &sender_id),
            self.friend_repo.find_friendship(&sender_id, &receiver.id),
        )?;

        if outgoing.is_some() {
            return Err(error::SystemError::conflict("Request already sent"));
        }
        if incoming.is_some() {
            return Err(error::SystemError::conflict("This user has already sent you a request"));
        }
        if friendship.is_some() {
            return Err(error::SystemError::conflict("You are already friends with this user"));
        }

        // a concurrent insert for the same pair surfaces as DuplicateKey
        let request = self.friend_repo.create_request(&sender_id, &receiver.id).await?;

        info!("Request {} sent from {} to {}", request.id, sender_id, receiver.id);
        Ok(request.id)
    }

    pub async fn deny(&self, user_id: Uuid, request_id: Uuid) -> Result<(), error::SystemError> {
        let request = self
            .friend_repo
            .find_request_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Request not found"))?;

        if request.receiver_id != user_id {
            return Err(error::SystemError::forbidden(
                "You can only respond to requests sent to you",
            ));
        }

        self.friend_repo.delete_request(&request.id).await
    }

    /// Returns the id of the direct conversation created for the new pair.
    pub async fn accept(&self, user_id: Uuid, request_id: Uuid) -> Result<Uuid, error::SystemError> {
        let request = self
            .friend_repo
            .find_request_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Request not found"))?;

        if request.receiver_id != user_id {
            return Err(error::SystemError::forbidden(
                "You can only respond to requests sent to you",
            ));
        }

        if self.friend_repo.find_friendship(&request.sender_id, &request.receiver_id).await?.is_some()
        {
            return Err(error::SystemError::conflict("You are already friends with this user"));
        }

        let accepted = self.friend_repo.accept_request_atomic(&request).await?;
        info!(
            "Request {} accepted, friendship {} with conversation {}",
            request.id, accepted.friendship_id, accepted.conversation_id
        );
        Ok(accepted.conversation_id)
    }

    pub async fn get_friends(&self, user_id: Uuid) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friendships = self.friend_repo.find_friendships(&user_id).await?;

        let friend_ids: Vec<Uuid> = friendships.iter().map(|f| f.other(&user_id)).collect();
        let users: HashMap<Uuid, UserEntity> = self
            .user_repo
            .find_by_ids(&friend_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(friendships
            .iter()
            .filter_map(|f| {
                users.get(&f.other(&user_id)).map(|u| FriendResponse {
                    conversation_id: f.conversation_id,
                    user: UserResponse::from(u.clone()),
                })
            })
            .collect())
    }

    /// Unfriends by direct conversation id; the conversation and its history go
    /// with the friendship.
    pub async fn remove_friend(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let friendship = self
            .friend_repo
            .find_friendship_by_conversation(&conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friendship not found"))?;

        if !friendship.involves(&user_id) {
            return Err(error::SystemError::forbidden("You are not part of this friendship"));
        }

        self.friend_repo.remove_friendship_atomic(&friendship).await?;
        info!("Friendship {} removed by {}", friendship.id, user_id);
        Ok(())
    }
}

//! In-memory implementations of every repository trait plus the cache, for
//! service tests.
//!
//! All tables sit behind one `tokio::sync::RwLock`; each write method takes the
//! write guard once, so multi-row writes are as atomic as their Postgres
//! transactions. Timestamps come from a monotonic fake clock (one second per
//! tick) so ordering assertions are deterministic.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    api::error,
    configs::CacheStore,
    modules::{
        conversation::{
            model::NewGroup,
            repository::ConversationRepository,
            schema::{ConversationEntity, MemberEntity},
        },
        friend::{
            model::AcceptedRequest,
            repository::{FriendRepo, FriendRepository, FriendRequestRepository},
            schema::{ordered_pair, FriendshipEntity, FriendshipStatus, RequestEntity, RequestStatus},
        },
        message::{
            model::InsertMessage,
            repository::MessageRepository,
            schema::{MessageEntity, MessageType},
        },
        user::{model::InsertUser, repository::UserRepository, schema::UserEntity},
    },
    utils::normalize_username,
};

const CLOCK_START_MILLIS: i64 = 1_700_000_000_000;

#[derive(Default)]
struct Tables {
    users: Vec<UserEntity>,
    conversations: Vec<ConversationEntity>,
    members: Vec<MemberEntity>,
    messages: Vec<MessageEntity>,
    requests: Vec<RequestEntity>,
    friendships: Vec<FriendshipEntity>,
}

impl Tables {
    fn delete_conversation_rows(&mut self, conversation_id: &Uuid) {
        self.messages.retain(|m| m.conversation_id != *conversation_id);
        self.members.retain(|m| m.conversation_id != *conversation_id);
        self.conversations.retain(|c| c.id != *conversation_id);
    }

    fn has_member(&self, conversation_id: &Uuid, member_id: &Uuid) -> bool {
        self.members.iter().any(|m| m.conversation_id == *conversation_id && m.member_id == *member_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: AtomicI64,
    fail_membership_scan: AtomicBool,
    failing_conversations: Mutex<HashSet<Uuid>>,
    failing_messages: Mutex<HashSet<Uuid>>,
}

fn injected() -> error::SystemError {
    error::SystemError::internal("injected failure")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp_millis(CLOCK_START_MILLIS + n * 1000).unwrap()
    }

    fn conversation_fails(&self, id: &Uuid) -> bool {
        self.failing_conversations.lock().unwrap().contains(id)
    }

    fn message_fails(&self, id: &Uuid) -> bool {
        self.failing_messages.lock().unwrap().contains(id)
    }

    // Failure injection

    pub fn fail_membership_scan(&self) {
        self.fail_membership_scan.store(true, Ordering::SeqCst);
    }

    pub fn fail_conversation(&self, id: Uuid) {
        self.failing_conversations.lock().unwrap().insert(id);
    }

    pub fn fail_message(&self, id: Uuid) {
        self.failing_messages.lock().unwrap().insert(id);
    }

    // Seeding

    pub async fn add_user(&self, username: &str, email: &str) -> UserEntity {
        let user = UserEntity {
            id: Uuid::now_v7(),
            external_id: format!("subject_{}", Uuid::now_v7().simple()),
            username: username.to_string(),
            normalized_username: normalize_username(username),
            email: email.to_string(),
            image_url: None,
            created_at: self.tick(),
        };
        self.tables.write().await.users.push(user.clone());
        user
    }

    pub async fn add_direct(&self, user_a: &Uuid, user_b: &Uuid) -> ConversationEntity {
        let mut t = self.tables.write().await;
        let conversation = ConversationEntity {
            id: Uuid::now_v7(),
            is_group: false,
            name: None,
            image_url: None,
            creator_id: None,
            last_message_id: None,
            created_at: self.tick(),
        };
        t.conversations.push(conversation.clone());
        for member_id in [user_a, user_b] {
            t.members.push(MemberEntity {
                conversation_id: conversation.id,
                member_id: *member_id,
                last_seen_message_id: None,
                joined_at: self.tick(),
            });
        }
        conversation
    }

    pub async fn add_text(&self, conversation_id: &Uuid, sender_id: &Uuid, content: &str) -> MessageEntity {
        self.add_message(conversation_id, sender_id, MessageType::Text, content).await
    }

    pub async fn add_message(
        &self,
        conversation_id: &Uuid,
        sender_id: &Uuid,
        _type: MessageType,
        content: &str,
    ) -> MessageEntity {
        self.create(&InsertMessage {
            conversation_id: *conversation_id,
            sender_id: *sender_id,
            _type,
            content: content.to_string(),
        })
        .await
        .unwrap()
    }

    pub async fn add_request(&self, sender_id: &Uuid, receiver_id: &Uuid) -> RequestEntity {
        self.create_request(sender_id, receiver_id).await.unwrap()
    }

    // Inspection

    pub async fn conversation(&self, id: &Uuid) -> Option<ConversationEntity> {
        self.tables.read().await.conversations.iter().find(|c| c.id == *id).cloned()
    }

    pub async fn conversations(&self) -> Vec<ConversationEntity> {
        self.tables.read().await.conversations.clone()
    }

    pub async fn member_ids(&self, conversation_id: &Uuid) -> Vec<Uuid> {
        let mut members: Vec<MemberEntity> = self
            .tables
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| (a.joined_at, a.member_id).cmp(&(b.joined_at, b.member_id)));
        members.into_iter().map(|m| m.member_id).collect()
    }

    pub async fn message_count(&self, conversation_id: &Uuid) -> usize {
        self.tables.read().await.messages.iter().filter(|m| m.conversation_id == *conversation_id).count()
    }

    pub async fn requests(&self) -> Vec<RequestEntity> {
        self.tables.read().await.requests.clone()
    }

    pub async fn friendships(&self) -> Vec<FriendshipEntity> {
        self.tables.read().await.friendships.clone()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.tables.read().await.users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError> {
        Ok(self.tables.read().await.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.tables.read().await.users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let email = email.to_lowercase();
        Ok(self.tables.read().await.users.iter().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn find_by_normalized_username(
        &self,
        normalized: &str,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .iter()
            .filter(|u| u.normalized_username == normalized)
            .cloned()
            .collect())
    }

    async fn upsert(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.users.iter_mut().find(|u| u.external_id == user.external_id) {
            existing.username = user.username.clone();
            existing.normalized_username = user.normalized_username.clone();
            existing.email = user.email.clone();
            existing.image_url = user.image_url.clone();
            return Ok(existing.clone());
        }
        let entity = UserEntity {
            id: Uuid::now_v7(),
            external_id: user.external_id.clone(),
            username: user.username.clone(),
            normalized_username: user.normalized_username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            created_at: self.tick(),
        };
        t.users.push(entity.clone());
        Ok(entity)
    }
}

#[async_trait::async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        if self.conversation_fails(conversation_id) {
            return Err(injected());
        }
        Ok(self.conversation(conversation_id).await)
    }

    async fn find_memberships_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError> {
        if self.fail_membership_scan.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let mut memberships: Vec<MemberEntity> = self
            .tables
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.member_id == *user_id)
            .cloned()
            .collect();
        memberships
            .sort_by(|a, b| (a.joined_at, a.conversation_id).cmp(&(b.joined_at, b.conversation_id)));
        Ok(memberships)
    }

    async fn find_members(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError> {
        let mut members: Vec<MemberEntity> = self
            .tables
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| (a.joined_at, a.member_id).cmp(&(b.joined_at, b.member_id)));
        Ok(members)
    }

    async fn find_membership(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<MemberEntity>, error::SystemError> {
        Ok(self
            .tables
            .read()
            .await
            .members
            .iter()
            .find(|m| m.conversation_id == *conversation_id && m.member_id == *user_id)
            .cloned())
    }

    async fn create_group(
        &self,
        group: &NewGroup,
    ) -> Result<ConversationEntity, error::SystemError> {
        let mut t = self.tables.write().await;
        let conversation = ConversationEntity {
            id: Uuid::now_v7(),
            is_group: true,
            name: Some(group.name.clone()),
            image_url: None,
            creator_id: Some(group.creator_id),
            last_message_id: None,
            created_at: self.tick(),
        };
        t.conversations.push(conversation.clone());
        for member_id in &group.member_ids {
            if !t.has_member(&conversation.id, member_id) {
                t.members.push(MemberEntity {
                    conversation_id: conversation.id,
                    member_id: *member_id,
                    last_seen_message_id: None,
                    joined_at: self.tick(),
                });
            }
        }
        Ok(conversation)
    }

    async fn update_name(
        &self,
        conversation_id: &Uuid,
        name: &str,
    ) -> Result<(), error::SystemError> {
        let mut t = self.tables.write().await;
        if let Some(c) = t.conversations.iter_mut().find(|c| c.id == *conversation_id) {
            c.name = Some(name.to_string());
        }
        Ok(())
    }

    async fn update_image(
        &self,
        conversation_id: &Uuid,
        image_url: &str,
    ) -> Result<(), error::SystemError> {
        let mut t = self.tables.write().await;
        if let Some(c) = t.conversations.iter_mut().find(|c| c.id == *conversation_id) {
            c.image_url = Some(image_url.to_string());
        }
        Ok(())
    }

    async fn add_members(
        &self,
        conversation_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<u64, error::SystemError> {
        let mut t = self.tables.write().await;
        let mut added = 0;
        for member_id in member_ids {
            if !t.has_member(conversation_id, member_id) {
                t.members.push(MemberEntity {
                    conversation_id: *conversation_id,
                    member_id: *member_id,
                    last_seen_message_id: None,
                    joined_at: self.tick(),
                });
                added += 1;
            }
        }
        Ok(added)
    }

    async fn delete_member(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let mut t = self.tables.write().await;
        let before = t.members.len();
        t.members.retain(|m| !(m.conversation_id == *conversation_id && m.member_id == *member_id));
        Ok(t.members.len() < before)
    }

    async fn transfer_creator_and_remove(
        &self,
        conversation_id: &Uuid,
        leaver_id: &Uuid,
        new_creator_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        let mut t = self.tables.write().await;
        if !t.has_member(conversation_id, new_creator_id) {
            return Err(error::SystemError::conflict("Group membership changed, try again"));
        }
        let conversation = t
            .conversations
            .iter_mut()
            .find(|c| c.id == *conversation_id && c.creator_id == Some(*leaver_id))
            .ok_or_else(|| error::SystemError::conflict("Group membership changed, try again"))?;
        conversation.creator_id = Some(*new_creator_id);
        t.members.retain(|m| !(m.conversation_id == *conversation_id && m.member_id == *leaver_id));
        Ok(())
    }

    async fn delete_cascade(&self, conversation_id: &Uuid) -> Result<(), error::SystemError> {
        self.tables.write().await.delete_conversation_rows(conversation_id);
        Ok(())
    }

    async fn update_last_seen(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
        message_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        let mut t = self.tables.write().await;
        if let Some(m) = t
            .members
            .iter_mut()
            .find(|m| m.conversation_id == *conversation_id && m.member_id == *member_id)
        {
            m.last_seen_message_id = Some(*message_id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageRepository for MemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MessageEntity>, error::SystemError> {
        if self.message_fails(id) {
            return Err(injected());
        }
        Ok(self.tables.read().await.messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut messages: Vec<MessageEntity> = self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(messages)
    }

    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut t = self.tables.write().await;
        let entity = MessageEntity {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            _type: message._type,
            content: message.content.clone(),
            created_at: self.tick(),
        };
        let conversation = t
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(|| error::SystemError::internal("conversation does not exist"))?;
        conversation.last_message_id = Some(entity.id);
        t.messages.push(entity.clone());
        Ok(entity)
    }

    async fn count_unread(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        last_seen_message_id: Option<Uuid>,
    ) -> Result<i64, error::SystemError> {
        let t = self.tables.read().await;
        let since = match last_seen_message_id {
            Some(id) => match t.messages.iter().find(|m| m.id == id) {
                Some(m) => Some(m.created_at),
                None => return Ok(0),
            },
            None => None,
        };
        let count = t
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id && m.sender_id != *user_id)
            .filter(|m| since.map_or(true, |s| m.created_at > s))
            .count();
        Ok(count as i64)
    }
}

#[async_trait::async_trait]
impl FriendRepository for MemoryStore {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let (user_1, user_2) = ordered_pair(*user_id_a, *user_id_b);
        Ok(self
            .tables
            .read()
            .await
            .friendships
            .iter()
            .find(|f| f.user_id_1 == user_1 && f.user_id_2 == user_2)
            .cloned())
    }

    async fn find_friendship_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        Ok(self
            .tables
            .read()
            .await
            .friendships
            .iter()
            .find(|f| f.conversation_id == *conversation_id)
            .cloned())
    }

    async fn find_friendships(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        Ok(self.tables.read().await.friendships.iter().filter(|f| f.involves(user_id)).cloned().collect())
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for MemoryStore {
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        Ok(self
            .tables
            .read()
            .await
            .requests
            .iter()
            .find(|r| r.sender_id == *sender_id && r.receiver_id == *receiver_id)
            .cloned())
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        Ok(self.tables.read().await.requests.iter().find(|r| r.id == *request_id).cloned())
    }

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RequestEntity>, error::SystemError> {
        let mut requests: Vec<RequestEntity> = self
            .tables
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.receiver_id == *user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn count_requests_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        Ok(self.tables.read().await.requests.iter().filter(|r| r.receiver_id == *user_id).count()
            as i64)
    }

    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestEntity, error::SystemError> {
        let request = RequestEntity {
            id: Uuid::now_v7(),
            sender_id: *sender_id,
            receiver_id: *receiver_id,
            status: RequestStatus::Pending,
            created_at: self.tick(),
        };
        self.tables.write().await.requests.push(request.clone());
        Ok(request)
    }

    async fn delete_request(&self, request_id: &Uuid) -> Result<(), error::SystemError> {
        self.tables.write().await.requests.retain(|r| r.id != *request_id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl FriendRepo for MemoryStore {
    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<AcceptedRequest, error::SystemError> {
        let mut t = self.tables.write().await;
        let before = t.requests.len();
        t.requests.retain(|r| r.id != request.id);
        if t.requests.len() == before {
            return Err(error::SystemError::not_found("Request not found"));
        }

        let conversation = ConversationEntity {
            id: Uuid::now_v7(),
            is_group: false,
            name: None,
            image_url: None,
            creator_id: None,
            last_message_id: None,
            created_at: self.tick(),
        };
        for member_id in [request.sender_id, request.receiver_id] {
            t.members.push(MemberEntity {
                conversation_id: conversation.id,
                member_id,
                last_seen_message_id: None,
                joined_at: self.tick(),
            });
        }

        let (user_id_1, user_id_2) = ordered_pair(request.sender_id, request.receiver_id);
        let friendship = FriendshipEntity {
            id: Uuid::now_v7(),
            user_id_1,
            user_id_2,
            conversation_id: conversation.id,
            status: FriendshipStatus::Active,
            created_at: self.tick(),
        };
        let accepted =
            AcceptedRequest { conversation_id: conversation.id, friendship_id: friendship.id };
        t.conversations.push(conversation);
        t.friendships.push(friendship);
        Ok(accepted)
    }

    async fn remove_friendship_atomic(
        &self,
        friendship: &FriendshipEntity,
    ) -> Result<(), error::SystemError> {
        let mut t = self.tables.write().await;
        t.friendships.retain(|f| f.id != friendship.id);
        t.delete_conversation_rows(&friendship.conversation_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, error::SystemError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        _expiration: u64,
    ) -> Result<(), error::SystemError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
}

#[derive(Debug, PartialEq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friendship_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Active,
}

/// Undirected pair, stored with `user_id_1 < user_id_2`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub user_id_1: Uuid,
    pub user_id_2: Uuid,
    pub conversation_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendshipEntity {
    pub fn other(&self, user_id: &Uuid) -> Uuid {
        if self.user_id_1 == *user_id {
            self.user_id_2
        } else {
            self.user_id_1
        }
    }

    pub fn involves(&self, user_id: &Uuid) -> bool {
        self.user_id_1 == *user_id || self.user_id_2 == *user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RequestEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

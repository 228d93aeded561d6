use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::repository_pg::delete_conversation_rows,
        friend::{
            model::AcceptedRequest,
            repository::{FriendRepo, FriendRepository, FriendRequestRepository},
            schema::{ordered_pair, FriendshipEntity, RequestEntity},
        },
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let (user_1, user_2) = ordered_pair(*user_id_a, *user_id_b);

        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE user_id_1 = $1 AND user_id_2 = $2",
        )
        .bind(user_1)
        .bind(user_2)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friendship_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friendships(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        let friendships = sqlx::query_as::<_, FriendshipEntity>(
            r#"
            SELECT *
            FROM friendships
            WHERE user_id_1 = $1
               OR user_id_2 = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friendships)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, RequestEntity>(
            "SELECT * FROM requests WHERE sender_id = $1 AND receiver_id = $2",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, RequestEntity>("SELECT * FROM requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn find_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, RequestEntity>(
            "SELECT * FROM requests WHERE receiver_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn count_requests_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE receiver_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestEntity, error::SystemError> {
        let id = Uuid::now_v7();
        let request = sqlx::query_as::<_, RequestEntity>(
            r#"
            INSERT INTO requests (id, sender_id, receiver_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn delete_request(&self, request_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<AcceptedRequest, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(request.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(error::SystemError::not_found("Request not found"));
        }

        let conversation_id = Uuid::now_v7();
        sqlx::query("INSERT INTO conversations (id, is_group) VALUES ($1, FALSE)")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO conversation_members (conversation_id, member_id)
            VALUES ($1, $2), ($1, $3)
            "#,
        )
        .bind(conversation_id)
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .execute(&mut *tx)
        .await?;

        let (user_1, user_2) = ordered_pair(request.sender_id, request.receiver_id);
        let friendship_id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO friendships (id, user_id_1, user_id_2, conversation_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(friendship_id)
        .bind(user_1)
        .bind(user_2)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AcceptedRequest { conversation_id, friendship_id })
    }

    async fn remove_friendship_atomic(
        &self,
        friendship: &FriendshipEntity,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(friendship.id)
            .execute(&mut *tx)
            .await?;

        delete_conversation_rows(&friendship.conversation_id, &mut tx).await?;

        tx.commit().await?;

        Ok(())
    }
}

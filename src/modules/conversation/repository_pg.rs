use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::NewGroup,
        repository::ConversationRepository,
        schema::{ConversationEntity, MemberEntity},
    },
};

#[derive(Clone)]
pub struct ConversationPgRepository {
    pool: sqlx::PgPool,
}

impl ConversationPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

/// Shared by group deletion and friend removal, both of which run it inside
/// their own transaction.
pub(crate) async fn delete_conversation_rows(
    conversation_id: &Uuid,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<(), error::SystemError> {
    sqlx::query("UPDATE conversations SET last_message_id = NULL WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM conversation_members WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationPgRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation =
            sqlx::query_as::<_, ConversationEntity>("SELECT * FROM conversations WHERE id = $1")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    async fn find_memberships_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError> {
        let memberships = sqlx::query_as::<_, MemberEntity>(
            "SELECT * FROM conversation_members WHERE member_id = $1 ORDER BY joined_at, conversation_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    async fn find_members(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MemberEntity>, error::SystemError> {
        let members = sqlx::query_as::<_, MemberEntity>(
            "SELECT * FROM conversation_members WHERE conversation_id = $1 ORDER BY joined_at, member_id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn find_membership(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<MemberEntity>, error::SystemError> {
        let member = sqlx::query_as::<_, MemberEntity>(
            "SELECT * FROM conversation_members WHERE conversation_id = $1 AND member_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn create_group(
        &self,
        group: &NewGroup,
    ) -> Result<ConversationEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let id = Uuid::now_v7();
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            INSERT INTO conversations (id, is_group, name, creator_id)
            VALUES ($1, TRUE, $2, $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&group.name)
        .bind(group.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        // WITH ORDINALITY keeps the creator first in join order
        sqlx::query(
            r#"
            INSERT INTO conversation_members (conversation_id, member_id, joined_at)
            SELECT $1, m.member_id, NOW() + (m.ord * INTERVAL '1 microsecond')
            FROM unnest($2::uuid[]) WITH ORDINALITY AS m(member_id, ord)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation.id)
        .bind(&group.member_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(conversation)
    }

    async fn update_name(
        &self,
        conversation_id: &Uuid,
        name: &str,
    ) -> Result<(), error::SystemError> {
        sqlx::query("UPDATE conversations SET name = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_image(
        &self,
        conversation_id: &Uuid,
        image_url: &str,
    ) -> Result<(), error::SystemError> {
        sqlx::query("UPDATE conversations SET image_url = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(image_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_members(
        &self,
        conversation_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<u64, error::SystemError> {
        let rows = sqlx::query(
            r#"
            INSERT INTO conversation_members (conversation_id, member_id, joined_at)
            SELECT $1, m.member_id, NOW() + (m.ord * INTERVAL '1 microsecond')
            FROM unnest($2::uuid[]) WITH ORDINALITY AS m(member_id, ord)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(member_ids)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }

    async fn delete_member(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "DELETE FROM conversation_members WHERE conversation_id = $1 AND member_id = $2",
        )
        .bind(conversation_id)
        .bind(member_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn transfer_creator_and_remove(
        &self,
        conversation_id: &Uuid,
        leaver_id: &Uuid,
        new_creator_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE conversations
            SET creator_id = $3
            WHERE id = $1
            AND creator_id = $2
            AND EXISTS (
                SELECT 1
                FROM conversation_members
                WHERE conversation_id = $1
                AND member_id = $3
            )
            "#,
        )
        .bind(conversation_id)
        .bind(leaver_id)
        .bind(new_creator_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(error::SystemError::conflict("Group membership changed, try again"));
        }

        sqlx::query(
            "DELETE FROM conversation_members WHERE conversation_id = $1 AND member_id = $2",
        )
        .bind(conversation_id)
        .bind(leaver_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete_cascade(&self, conversation_id: &Uuid) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;
        delete_conversation_rows(conversation_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_last_seen(
        &self,
        conversation_id: &Uuid,
        member_id: &Uuid,
        message_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            UPDATE conversation_members
            SET last_seen_message_id = $3
            WHERE conversation_id = $1
            AND member_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(member_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::InsertUser, repository::UserRepository, schema::UserEntity},
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError> {
        let users = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE lower(email) = lower($1) ORDER BY created_at LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_normalized_username(
        &self,
        normalized: &str,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        // has index on normalized_username
        let users = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE normalized_username = $1 ORDER BY created_at, id",
        )
        .bind(normalized)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn upsert(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let id = Uuid::now_v7();
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, external_id, username, normalized_username, email, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE
            SET username            = EXCLUDED.username,
                normalized_username = EXCLUDED.normalized_username,
                email               = EXCLUDED.email,
                image_url           = EXCLUDED.image_url
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.external_id)
        .bind(&user.username)
        .bind(&user.normalized_username)
        .bind(&user.email)
        .bind(&user.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::InsertUser, schema::UserEntity},
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;

    /// All users whose `normalized_username` equals `normalized`, oldest first.
    async fn find_by_normalized_username(
        &self,
        normalized: &str,
    ) -> Result<Vec<UserEntity>, error::SystemError>;

    /// Inserts the user, or refreshes the profile of the user with the same
    /// `external_id`.
    async fn upsert(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;
}

use log::{info, warn};
use std::sync::Arc;

use crate::api::error;
use crate::configs::{cache_get, cache_set, CacheStore};
use crate::modules::user::model::{InsertUser, SyncUserModel};
use crate::modules::user::{repository::UserRepository, schema::UserEntity};
use crate::utils::{normalize_username, Claims};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<dyn CacheStore>,
    cache_ttl: u64,
}

fn subject_key(subject: &str) -> String {
    format!("user:subject:{subject}")
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<dyn CacheStore>,
        cache_ttl: u64,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache, cache_ttl }
    }

    /// Resolves the token subject to the internal user record. Cache failures
    /// degrade to a database read.
    pub async fn current_user(&self, claims: &Claims) -> Result<UserEntity, error::SystemError> {
        let key = subject_key(&claims.sub);
        match cache_get::<UserEntity, _>(self.cache.as_ref(), &key).await {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => {}
            Err(e) => warn!("Identity cache read failed for {}: {:?}", claims.sub, e),
        }

        let user = self
            .repo
            .find_by_external_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Err(e) = cache_set(self.cache.as_ref(), &key, &user, self.cache_ttl).await {
            warn!("Identity cache write failed for {}: {:?}", claims.sub, e);
        }

        Ok(user)
    }

    pub async fn sync(
        &self,
        claims: &Claims,
        profile: SyncUserModel,
    ) -> Result<UserEntity, error::SystemError> {
        let username = profile.username.trim().to_string();
        if username.is_empty() {
            return Err(error::SystemError::bad_request("Username cannot be empty"));
        }

        let user = InsertUser {
            external_id: claims.sub.clone(),
            normalized_username: normalize_username(&username),
            username,
            email: profile.email.trim().to_string(),
            image_url: profile.image_url,
        };

        let entity = self.repo.upsert(&user).await?;

        if let Err(e) = self.cache.delete(&subject_key(&claims.sub)).await {
            warn!("Identity cache invalidation failed for {}: {:?}", claims.sub, e);
        }

        info!("User {} synced from identity provider", entity.id);
        Ok(entity)
    }
}

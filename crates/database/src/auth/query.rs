// database/auth/query.rs - database queries for the refresh token model

use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    options::FindOneAndUpdateOptions,
    Database,
};
use tracing::debug;

use super::model::RefreshTokenModel;
use super::REFRESH_TOKENS_COLLECTION;
use crate::{DatabaseError, EntityRepository};

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn get_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<Option<RefreshTokenModel>, DatabaseError>;
    /// Inserts or overwrites the hash stored for the device
    async fn update_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
        hashed_token: &str,
    ) -> Result<(), DatabaseError>;
    /// Returns whether a record was removed
    async fn delete_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<bool, DatabaseError>;
}

#[derive(Clone, Debug)]
pub struct RefreshTokenRepository {
    repository: EntityRepository<RefreshTokenModel>,
}

impl RefreshTokenRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            repository: EntityRepository::new(database.collection(REFRESH_TOKENS_COLLECTION)),
        }
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenRepository {
    async fn get_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<Option<RefreshTokenModel>, DatabaseError> {
        self.repository
            .find_one(doc! { "userId": *user_id, "deviceName": device_name }, None)
            .await
    }

    async fn update_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
        hashed_token: &str,
    ) -> Result<(), DatabaseError> {
        let filter = doc! { "userId": *user_id, "deviceName": device_name };
        let update = doc! {
            "$set": { "refreshToken": hashed_token, "updatedAt": DateTime::now() }
        };
        let options = FindOneAndUpdateOptions::builder().upsert(true).build();

        match self
            .repository
            .find_one_and_update(filter.clone(), update.clone(), Some(options.clone()))
            .await
        {
            // A concurrent first login for the device inserted the record, it now exists
            Err(DatabaseError::DuplicateKey) => {
                debug!("Upsert raced on (userId, deviceName), retrying");
                self.repository
                    .find_one_and_update(filter, update, Some(options))
                    .await?;
            }
            res => {
                res?;
            }
        }
        Ok(())
    }

    async fn delete_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<bool, DatabaseError> {
        self.repository
            .delete_many(doc! { "userId": *user_id, "deviceName": device_name })
            .await
    }
}

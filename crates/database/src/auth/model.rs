// database/auth/model.rs - model for the hashed refresh token held per user device

use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Database,
};
use serde::{Deserialize, Serialize};

use super::REFRESH_TOKENS_COLLECTION;
use crate::{set_unique_index, DatabaseError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenModel {
    pub user_id: ObjectId,
    pub device_name: String,
    /// Hash of the refresh token handed to the device
    pub refresh_token: String,
    pub updated_at: DateTime,
}

// At most one token per (user, device)
pub async fn create_refresh_token_index(database: &Database) -> Result<(), DatabaseError> {
    let collection = database.collection::<RefreshTokenModel>(REFRESH_TOKENS_COLLECTION);
    set_unique_index(&collection, doc! { "userId": 1, "deviceName": 1 }).await
}

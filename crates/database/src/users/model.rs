// database/users/model.rs - model for the users collection

use mongodb::{
    bson::{doc, oid::ObjectId, DateTime, Document},
    Database,
};
use serde::{Deserialize, Serialize};

use super::USERS_COLLECTION;
use crate::{set_unique_index, DatabaseError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    /// Argon2 hash, never the plain password
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub device_token: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl UserModel {
    pub fn new(email: &str, password_hash: String, first_name: &str, last_name: &str) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            email: email.to_string(),
            password: password_hash,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: None,
            image: None,
            device_token: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Typed filter for user lookups. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserFilter {
    pub fn admins() -> Self {
        Self {
            is_admin: Some(true),
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(email) = &self.email {
            filter.insert("email", email.clone());
        }
        if let Some(first_name) = &self.first_name {
            filter.insert("firstName", first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            filter.insert("lastName", last_name.clone());
        }
        if let Some(is_admin) = self.is_admin {
            filter.insert("isAdmin", is_admin);
        }
        filter
    }

    pub fn matches(&self, user: &UserModel) -> bool {
        self.email.as_ref().map_or(true, |v| *v == user.email)
            && self.first_name.as_ref().map_or(true, |v| *v == user.first_name)
            && self.last_name.as_ref().map_or(true, |v| *v == user.last_name)
            && self.is_admin.map_or(true, |v| v == user.is_admin)
    }
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub device_token: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_document(&self, now: DateTime) -> Document {
        let mut set = doc! { "updatedAt": now };
        if let Some(email) = &self.email {
            set.insert("email", email.clone());
        }
        if let Some(password) = &self.password {
            set.insert("password", password.clone());
        }
        if let Some(first_name) = &self.first_name {
            set.insert("firstName", first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            set.insert("lastName", last_name.clone());
        }
        if let Some(phone) = &self.phone {
            set.insert("phone", phone.clone());
        }
        if let Some(image) = &self.image {
            set.insert("image", image.clone());
        }
        if let Some(device_token) = &self.device_token {
            set.insert("deviceToken", device_token.clone());
        }
        if let Some(is_admin) = self.is_admin {
            set.insert("isAdmin", is_admin);
        }
        doc! { "$set": set }
    }

    pub fn apply(&self, user: &mut UserModel, now: DateTime) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(image) = &self.image {
            user.image = Some(image.clone());
        }
        if let Some(device_token) = &self.device_token {
            user.device_token = Some(device_token.clone());
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = now;
    }
}

pub async fn create_user_index(database: &Database) -> Result<(), DatabaseError> {
    let collection = database.collection::<UserModel>(USERS_COLLECTION);
    set_unique_index(&collection, doc! { "email": 1 }).await
}

// database/users/query.rs - query abstractions for the users collection

use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Database,
};

use super::model::{UserFilter, UserModel, UserUpdate};
use super::USERS_COLLECTION;
use crate::{DatabaseError, EntityRepository, Page, Paginate};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserModel>, DatabaseError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, DatabaseError>;
    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<UserModel>, DatabaseError>;
    async fn find_page(
        &self,
        filter: &UserFilter,
        paginate: Paginate,
    ) -> Result<Page<UserModel>, DatabaseError>;
    /// Fails with `DatabaseError::DuplicateKey` when the email is taken
    async fn create(&self, user: UserModel) -> Result<UserModel, DatabaseError>;
    async fn update(
        &self,
        id: &ObjectId,
        update: &UserUpdate,
    ) -> Result<Option<UserModel>, DatabaseError>;
}

#[derive(Clone, Debug)]
pub struct UsersRepository {
    repository: EntityRepository<UserModel>,
}

impl UsersRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            repository: EntityRepository::new(database.collection(USERS_COLLECTION)),
        }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserModel>, DatabaseError> {
        self.repository.find_one(doc! { "_id": *id }, None).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, DatabaseError> {
        self.repository.find_one(doc! { "email": email }, None).await
    }

    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<UserModel>, DatabaseError> {
        self.repository.find(filter.to_document(), None).await
    }

    async fn find_page(
        &self,
        filter: &UserFilter,
        paginate: Paginate,
    ) -> Result<Page<UserModel>, DatabaseError> {
        self.repository
            .find_with_pagination(filter.to_document(), None, paginate)
            .await
    }

    async fn create(&self, user: UserModel) -> Result<UserModel, DatabaseError> {
        self.repository.create(user).await
    }

    async fn update(
        &self,
        id: &ObjectId,
        update: &UserUpdate,
    ) -> Result<Option<UserModel>, DatabaseError> {
        self.repository
            .find_one_and_update(doc! { "_id": *id }, update.to_document(DateTime::now()), None)
            .await
    }
}

// database/codes/query.rs - lookups for verification codes issued to an email

use async_trait::async_trait;
use mongodb::{
    bson::{doc, DateTime},
    options::FindOneOptions,
    Database,
};

use super::model::VerificationCodeModel;
use super::CODES_COLLECTION;
use crate::{DatabaseError, EntityRepository};

#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Latest code for `email` that has not expired yet
    async fn find_active_code(
        &self,
        email: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError>;
    async fn find_code_by_email_and_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError>;
    async fn insert_code(
        &self,
        code: VerificationCodeModel,
    ) -> Result<VerificationCodeModel, DatabaseError>;
}

#[derive(Clone, Debug)]
pub struct CodeRepository {
    repository: EntityRepository<VerificationCodeModel>,
}

impl CodeRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            repository: EntityRepository::new(database.collection(CODES_COLLECTION)),
        }
    }

    fn newest_first() -> Option<FindOneOptions> {
        Some(FindOneOptions::builder().sort(doc! { "createdAt": -1 }).build())
    }
}

#[async_trait]
impl CodeStore for CodeRepository {
    async fn find_active_code(
        &self,
        email: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError> {
        let filter = doc! { "email": email, "expiresAt": { "$gt": DateTime::now() } };
        self.repository.find_one(filter, Self::newest_first()).await
    }

    async fn find_code_by_email_and_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError> {
        let filter = doc! {
            "email": email,
            "otp": otp,
            "expiresAt": { "$gt": DateTime::now() },
        };
        self.repository.find_one(filter, Self::newest_first()).await
    }

    async fn insert_code(
        &self,
        code: VerificationCodeModel,
    ) -> Result<VerificationCodeModel, DatabaseError> {
        self.repository.create(code).await
    }
}

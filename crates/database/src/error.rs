// database/error.rs - error kinds surfaced by the persistence layer

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Duplicate key error. Document already exists!")]
    DuplicateKey,
    /// A create failed for a reason other than a unique index violation
    #[error("An error occurred: {0}")]
    Persistence(mongodb::error::Error),
    #[error("code lifetime of {0}s is out of range")]
    InvalidTtl(u64),
    #[error("database query failed: {0}")]
    Query(#[from] mongodb::error::Error),
}

impl DatabaseError {
    /// Sorts a write error into `DuplicateKey` or `Persistence`
    pub fn from_write(error: mongodb::error::Error) -> Self {
        if is_duplicate_key(&error) {
            DatabaseError::DuplicateKey
        } else {
            DatabaseError::Persistence(error)
        }
    }
}

pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

// database/codes/model.rs - model for one-time verification codes

use mongodb::{bson::DateTime, Database};
use serde::{Deserialize, Serialize};

use super::CODES_COLLECTION;
use crate::{set_ttl_index, DatabaseError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCodeModel {
    pub email: String,
    pub otp: String,
    pub expires_at: DateTime,
    pub created_at: DateTime,
}

impl VerificationCodeModel {
    /// Fails with `InvalidTtl` when the expiry does not fit a BSON date
    pub fn new(email: &str, otp: &str, valid_for_secs: u64) -> Result<Self, DatabaseError> {
        let now = DateTime::now();
        let expires_at = i64::try_from(valid_for_secs)
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(|millis| now.timestamp_millis().checked_add(millis))
            .ok_or(DatabaseError::InvalidTtl(valid_for_secs))?;

        Ok(Self {
            email: email.to_string(),
            otp: otp.to_string(),
            expires_at: DateTime::from_millis(expires_at),
            created_at: now,
        })
    }

    pub fn is_active(&self, now: DateTime) -> bool {
        self.expires_at > now
    }
}

// Codes are removed by MongoDB as soon as they expire
pub async fn create_code_index(database: &Database) -> Result<(), DatabaseError> {
    let collection = database.collection::<VerificationCodeModel>(CODES_COLLECTION);
    set_ttl_index(&collection, "expiresAt", 0).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_code_is_active_until_expiry() {
        let code = VerificationCodeModel::new("a@x.com", "123456", 60).unwrap();
        assert!(code.is_active(DateTime::now()));

        let later = DateTime::from_millis(code.expires_at.timestamp_millis() + 1);
        assert!(!code.is_active(later));
    }

    #[test]
    fn overflowing_ttl_is_rejected() {
        assert!(matches!(
            VerificationCodeModel::new("a@x.com", "123456", u64::MAX),
            Err(DatabaseError::InvalidTtl(u64::MAX))
        ));
        assert!(VerificationCodeModel::new("a@x.com", "123456", i64::MAX as u64).is_err());
    }
}

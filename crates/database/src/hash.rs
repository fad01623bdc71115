// database/hash.rs - one-way hashing for passwords and refresh tokens

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Version,
};
pub use argon2::Params;
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("hashing task failed: {0}")]
    Task(#[from] task::JoinError),
}

impl From<argon2::password_hash::Error> for HashError {
    fn from(error: argon2::password_hash::Error) -> Self {
        HashError::Hash(error.to_string())
    }
}

/// Argon2id hashing. Work runs on the blocking pool so request tasks are not stalled.
#[derive(Clone, Debug, Default)]
pub struct HashService {
    params: Params,
}

impl HashService {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    pub async fn hash_data(&self, plain: &str) -> Result<String, HashError> {
        let plain = plain.to_owned();
        let params = self.params.clone();

        task::spawn_blocking(move || -> Result<_, HashError> {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Self::argon2(params).hash_password(plain.as_bytes(), &salt)?;
            Ok(hash.to_string())
        })
        .await?
    }

    /// Checks `plain` against a stored PHC string; parameters are read from the hash itself
    pub async fn is_match_hashed(&self, hash: &str, plain: &str) -> Result<bool, HashError> {
        let hash = hash.to_owned();
        let plain = plain.to_owned();
        let params = self.params.clone();

        task::spawn_blocking(move || -> Result<_, HashError> {
            let parsed = PasswordHash::new(&hash)?;
            match Self::argon2(params).verify_password(plain.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> HashService {
        HashService::new(Params::new(8, 1, 1, None).unwrap())
    }

    #[tokio::test]
    async fn hash_verifies_only_the_hashed_input() {
        let hasher = hasher();
        let hash = hasher.hash_data("p1").await.unwrap();

        assert_ne!(hash, "p1");
        assert!(hasher.is_match_hashed(&hash, "p1").await.unwrap());
        assert!(!hasher.is_match_hashed(&hash, "p2").await.unwrap());
    }

    #[tokio::test]
    async fn same_input_gets_a_fresh_salt() {
        let hasher = hasher();
        let first = hasher.hash_data("secret").await.unwrap();
        let second = hasher.hash_data("secret").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn long_inputs_differing_at_the_end_do_not_collide() {
        let hasher = hasher();
        let prefix = "a".repeat(200);
        let hash = hasher.hash_data(&format!("{prefix}1")).await.unwrap();

        assert!(!hasher
            .is_match_hashed(&hash, &format!("{prefix}2"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let hasher = hasher();
        assert!(hasher.is_match_hashed("not-a-hash", "p1").await.is_err());
    }
}

// services/mod.rs - business logic behind the HTTP routes

pub mod auth;
pub mod users;

pub use auth::AuthService;
pub use users::UsersService;

#[cfg(test)]
pub mod test_support {
    use super::{AuthService, UsersService};
    use crate::config::{TokenConfig, TokenSettings};
    use crate::dto::SignUpDto;
    use database::codes::{CodeStore, VerificationCodeModel};
    use database::memory::{MemoryCodes, MemoryRefreshTokens, MemoryUsers};
    use database::hash::{HashService, Params};
    use std::sync::Arc;

    /// In-memory stores plus cheap hashing, shared by service and route tests
    pub struct Harness {
        pub users: Arc<MemoryUsers>,
        pub codes: Arc<MemoryCodes>,
        pub refresh_tokens: Arc<MemoryRefreshTokens>,
        pub hash: HashService,
        pub tokens: TokenConfig,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                users: Arc::new(MemoryUsers::default()),
                codes: Arc::new(MemoryCodes::default()),
                refresh_tokens: Arc::new(MemoryRefreshTokens::default()),
                hash: HashService::new(Params::new(8, 1, 1, None).unwrap()),
                tokens: TokenConfig {
                    access: TokenSettings {
                        secret: "access-secret".to_string(),
                        validity_in_seconds: 900,
                    },
                    refresh: TokenSettings {
                        secret: "refresh-secret".to_string(),
                        validity_in_seconds: 604800,
                    },
                },
            }
        }

        pub async fn issue_code(&self, email: &str, otp: &str) {
            self.codes
                .insert_code(VerificationCodeModel::new(email, otp, 600).unwrap())
                .await
                .unwrap();
        }
    }

    pub fn auth_service(harness: &Harness) -> AuthService {
        AuthService::new(
            harness.users.clone(),
            harness.codes.clone(),
            harness.refresh_tokens.clone(),
            harness.hash.clone(),
            harness.tokens.clone(),
        )
    }

    pub fn users_service(harness: &Harness) -> UsersService {
        UsersService::new(harness.users.clone(), harness.hash.clone())
    }

    pub fn signup_dto(email: &str, password: &str) -> SignUpDto {
        SignUpDto {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            device_token: None,
            device_name: "phone".to_string(),
        }
    }
}

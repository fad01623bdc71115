// services/auth.rs - signup, login, password reset and per-device token rotation

use database::{
    auth::RefreshTokenStore,
    codes::CodeStore,
    users::{UserModel, UserStore, UserUpdate},
    DatabaseError, HashService,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::auth::{create_jwt, Payload};
use crate::config::{TokenConfig, TokenSettings};
use crate::dto::{
    AuthResponse, ForgotPasswordDto, JwtPair, LoginDto, PasswordResetResponse, SignUpDto,
};
use crate::error::{ServiceError, ACCESS_DENIED, INVALID_CREDENTIALS};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    codes: Arc<dyn CodeStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hash: HashService,
    tokens: TokenConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codes: Arc<dyn CodeStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        hash: HashService,
        tokens: TokenConfig,
    ) -> Self {
        Self {
            users,
            codes,
            refresh_tokens,
            hash,
            tokens,
        }
    }

    #[instrument(skip_all, fields(email = %dto.email, device = %dto.device_name))]
    pub async fn signup(&self, dto: SignUpDto) -> Result<AuthResponse, ServiceError> {
        dto.validate()?;

        if self.users.find_by_email(&dto.email).await?.is_some() {
            warn!("Signup attempted with a registered email");
            return Err(ServiceError::AlreadyExists);
        }

        if self.codes.find_active_code(&dto.email).await?.is_none() {
            warn!("Signup attempted without an active verification code");
            return Err(ServiceError::PreconditionFailed);
        }

        let password = self.hash.hash_data(&dto.password).await?;
        let mut user = UserModel::new(&dto.email, password, &dto.first_name, &dto.last_name);
        user.phone = dto.phone;
        user.device_token = dto.device_token;

        let user = match self.users.create(user).await {
            Ok(user) => user,
            // lost a race with a concurrent signup for the same email
            Err(DatabaseError::DuplicateKey) => return Err(ServiceError::AlreadyExists),
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %user.id, "User signed up");

        self.start_session(user, &dto.device_name).await
    }

    #[instrument(skip_all, fields(email = %dto.email, device = %dto.device_name))]
    pub async fn login(&self, dto: LoginDto) -> Result<AuthResponse, ServiceError> {
        dto.validate()?;

        let user = match self.users.find_by_email(&dto.email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempted for an unknown email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !self.hash.is_match_hashed(&user.password, &dto.password).await? {
            warn!(user_id = %user.id, "Login attempted with a wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS));
        }

        let user = match dto.device_token {
            Some(device_token) => {
                debug!("Storing device token");
                let update = UserUpdate {
                    device_token: Some(device_token),
                    ..Default::default()
                };
                self.users
                    .update(&user.id, &update)
                    .await?
                    .ok_or(ServiceError::NotFound)?
            }
            None => user,
        };
        info!(user_id = %user.id, "User logged in");

        self.start_session(user, &dto.device_name).await
    }

    #[instrument(skip_all, fields(email = %dto.email, device = %dto.device_name))]
    pub async fn forgot_password(
        &self,
        dto: ForgotPasswordDto,
    ) -> Result<PasswordResetResponse, ServiceError> {
        dto.validate()?;

        if self
            .codes
            .find_code_by_email_and_otp(&dto.email, &dto.otp)
            .await?
            .is_none()
        {
            warn!("Password reset attempted with an invalid OTP");
            return Err(ServiceError::InvalidOtp);
        }

        let user = self
            .users
            .find_by_email(&dto.email)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let update = UserUpdate {
            password: Some(self.hash.hash_data(&dto.new_password).await?),
            ..Default::default()
        };
        let user = self
            .users
            .update(&user.id, &update)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!(user_id = %user.id, "Password reset");

        let tokens = self.issue_tokens(&user, &dto.device_name).await?;

        Ok(PasswordResetResponse {
            msg: "Your password changed successfully.".to_string(),
            tokens,
        })
    }

    /// Signs the access and refresh tokens concurrently
    pub async fn get_tokens(&self, payload: &Payload) -> Result<JwtPair, ServiceError> {
        let (access_token, refresh_token) = futures::try_join!(
            sign(payload.clone(), self.tokens.access.clone()),
            sign(payload.clone(), self.tokens.refresh.clone()),
        )?;

        Ok(JwtPair {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: &str, device_name: &str) -> Result<bool, ServiceError> {
        let user_id = match ObjectId::parse_str(user_id) {
            Ok(user_id) => user_id,
            Err(_) => return Ok(false),
        };

        let removed = self
            .refresh_tokens
            .delete_refresh_token(&user_id, device_name)
            .await?;
        info!(removed, "User logged out");
        Ok(removed)
    }

    /// Rotates the pair for a device. `refresh_token` is the raw token presented by the client.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_tokens(
        &self,
        user_id: &str,
        device_name: &str,
        refresh_token: &str,
    ) -> Result<AuthResponse, ServiceError> {
        let denied = || ServiceError::Forbidden(ACCESS_DENIED);

        let user_id = ObjectId::parse_str(user_id).map_err(|_| denied())?;
        let user = self.users.find_by_id(&user_id).await?.ok_or_else(denied)?;

        let stored = match self
            .refresh_tokens
            .get_refresh_token(&user_id, device_name)
            .await?
        {
            Some(stored) => stored,
            None => {
                warn!("No refresh token stored for device");
                return Err(denied());
            }
        };

        if !self
            .hash
            .is_match_hashed(&stored.refresh_token, refresh_token)
            .await?
        {
            warn!("Refresh token does not match the one stored for device");
            return Err(denied());
        }

        debug!("Refresh token verified, rotating");
        self.start_session(user, device_name).await
    }

    pub async fn update_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
        refresh_token: &str,
    ) -> Result<(), ServiceError> {
        let hashed = self.hash.hash_data(refresh_token).await?;
        self.refresh_tokens
            .update_refresh_token(user_id, device_name, &hashed)
            .await?;
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &UserModel,
        device_name: &str,
    ) -> Result<JwtPair, ServiceError> {
        let payload = Payload {
            user_id: user.id.to_hex(),
            is_admin: user.is_admin,
            device_name: device_name.to_string(),
        };

        let tokens = self.get_tokens(&payload).await?;
        self.update_refresh_token(&user.id, device_name, &tokens.refresh_token)
            .await?;
        Ok(tokens)
    }

    async fn start_session(
        &self,
        user: UserModel,
        device_name: &str,
    ) -> Result<AuthResponse, ServiceError> {
        let tokens = self.issue_tokens(&user, device_name).await?;
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }
}

async fn sign(payload: Payload, settings: TokenSettings) -> Result<String, ServiceError> {
    task::spawn_blocking(move || create_jwt(&payload, &settings))
        .await
        .map_err(|e| ServiceError::Internal(format!("token signing task failed: {e}")))?
        .map_err(ServiceError::from)
}

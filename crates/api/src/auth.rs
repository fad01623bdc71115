// auth.rs - JWT claims, token helpers and the request guards built on them

use super::config::{TokenConfig, TokenSettings};
use super::error::ApiError;
use actix_web::{
    dev::Payload as RequestPayload,
    http::header::{HeaderMap, AUTHORIZATION},
    web::Data,
    FromRequest, HttpRequest,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Identity carried by both tokens of a pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub user_id: String,
    pub is_admin: bool,
    pub device_name: String,
}

// Claims to be added to JWT
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub is_admin: bool,
    pub device_name: String,
    pub jti: String, // Unique per token so two tokens minted in the same second still differ
    pub iat: usize,
    pub exp: usize, // Required (validate_exp defaults to true in validation). Expiration time (as UTC timestamp)
}

impl Claims {
    pub fn payload(&self) -> Payload {
        Payload {
            user_id: self.user_id.clone(),
            is_admin: self.is_admin,
            device_name: self.device_name.clone(),
        }
    }
}

// Creates a JWT for the payload provided
pub fn create_jwt(
    payload: &Payload,
    settings: &TokenSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expiration = now + chrono::Duration::seconds(settings.validity_in_seconds);

    let claims = Claims {
        user_id: payload.user_id.clone(),
        is_admin: payload.is_admin,
        device_name: payload.device_name.clone(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    let header = Header::new(Algorithm::HS512);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(settings.secret.as_ref()),
    )
}

pub fn decode_jwt(
    token: &str,
    settings: &TokenSettings,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
}

// Gets a JWT from the request headers
pub fn jwt_from_header(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Auth header not found".to_string()))?;

    let auth_header = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Auth header not found".to_string()))?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_owned()),
        _ => Err(ApiError::Unauthorized("Invalid Auth Header".to_string())),
    }
}

/// What a route demands from the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

impl Access {
    pub fn check(self, principal: Option<&Claims>) -> Result<(), ApiError> {
        match (self, principal) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(ApiError::Unauthorized("Unauthorized".to_string())),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::AdminOnly, Some(claims)) if claims.is_admin => Ok(()),
            (Access::AdminOnly, Some(_)) => {
                Err(ApiError::Forbidden("Can't access this route.".to_string()))
            }
        }
    }
}

fn token_config(req: &HttpRequest) -> Result<&TokenConfig, ApiError> {
    req.app_data::<Data<TokenConfig>>()
        .map(|config| config.get_ref())
        .ok_or_else(|| {
            error!("Token configuration missing from app data");
            ApiError::Internal
        })
}

// Decodes the bearer token with the given settings, `None` when absent or invalid
fn principal(
    req: &HttpRequest,
    settings: impl Fn(&TokenConfig) -> &TokenSettings,
) -> Result<Option<(Claims, String)>, ApiError> {
    let config = token_config(req)?;

    let token = match jwt_from_header(req.headers()) {
        Ok(token) => token,
        Err(e) => {
            debug!("No usable bearer token: {}", e);
            return Ok(None);
        }
    };

    match decode_jwt(&token, settings(config)) {
        Ok(claims) => Ok(Some((claims, token))),
        Err(e) => {
            warn!("Validation failed for bearer token. Error: {}", e);
            Ok(None)
        }
    }
}

fn guard(req: &HttpRequest, access: Access) -> Result<Claims, ApiError> {
    let claims = principal(req, |config| &config.access)?.map(|(claims, _)| claims);
    access.check(claims.as_ref())?;
    claims.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
}

/// Caller holding a valid access token
#[derive(Debug)]
pub struct AuthUser(pub Claims);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut RequestPayload) -> Self::Future {
        ready(guard(req, Access::Authenticated).map(AuthUser))
    }
}

/// Caller holding a valid access token with `isAdmin` set
#[derive(Debug)]
pub struct AdminUser(pub Claims);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut RequestPayload) -> Self::Future {
        ready(guard(req, Access::AdminOnly).map(AdminUser))
    }
}

/// Caller presenting a refresh token signed with the refresh secret
#[derive(Debug)]
pub struct RefreshUser {
    pub claims: Claims,
    pub token: String,
}

impl FromRequest for RefreshUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut RequestPayload) -> Self::Future {
        let res = match principal(req, |config| &config.refresh) {
            Ok(Some((claims, token))) => Ok(RefreshUser { claims, token }),
            Ok(None) => Err(ApiError::Forbidden("Access Denied".to_string())),
            Err(e) => Err(e),
        };
        ready(res)
    }
}

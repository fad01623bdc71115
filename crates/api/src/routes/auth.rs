// routes/auth.rs - API routes for signup, login and session handling

use crate::auth::{AuthUser, RefreshUser};
use crate::dto::{ForgotPasswordDto, LoginDto, SignUpDto};
use crate::error::ApiError;
use crate::services::AuthService;
use actix_web::{
    post,
    web::{Data, Json},
    HttpResponse,
};
use tracing::info;

#[tracing::instrument(
    name = "/auth/signup - Registers a verified email and starts a session",
    skip_all,
    fields(email = %req_data.email)
)]
#[post("/auth/signup")]
pub async fn signup(
    service: Data<AuthService>,
    req_data: Json<SignUpDto>,
) -> Result<HttpResponse, ApiError> {
    let response = service.signup(req_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[tracing::instrument(
    name = "/auth/login - Checks credentials and returns a JWT pair",
    skip_all,
    fields(email = %req_data.email)
)]
#[post("/auth/login")]
pub async fn login(
    service: Data<AuthService>,
    req_data: Json<LoginDto>,
) -> Result<HttpResponse, ApiError> {
    let response = service.login(req_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(
    name = "/auth/forgot-password - Resets the password with a one-time code",
    skip_all,
    fields(email = %req_data.email)
)]
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    service: Data<AuthService>,
    req_data: Json<ForgotPasswordDto>,
) -> Result<HttpResponse, ApiError> {
    let response = service.forgot_password(req_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(
    name = "/auth/refresh - Checks a provided refresh token, returns a new access token and refresh token.",
    skip_all,
    fields(user_id = %user.claims.user_id, device = %user.claims.device_name)
)]
#[post("/auth/refresh")]
pub async fn refresh(
    service: Data<AuthService>,
    user: RefreshUser,
) -> Result<HttpResponse, ApiError> {
    let response = service
        .refresh_tokens(&user.claims.user_id, &user.claims.device_name, &user.token)
        .await?;
    info!("User refresh succeeded.");
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(
    name = "/auth/logout - Drops the refresh token of the calling device",
    skip_all,
    fields(user_id = %user.0.user_id, device = %user.0.device_name)
)]
#[post("/auth/logout")]
pub async fn logout(service: Data<AuthService>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    service.logout(&user.0.user_id, &user.0.device_name).await?;
    Ok(HttpResponse::NoContent().finish())
}

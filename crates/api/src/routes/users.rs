// routes/users.rs - API routes for the user resource

use super::parse_object_id;
use crate::auth::{AdminUser, AuthUser};
use crate::config::UploadConfig;
use crate::dto::{
    CreateUserDto, PageResponse, UpdateUserByAdminDto, UpdateUserDto, UpdateUserPasswordDto,
    UserResponse, UsersQuery,
};
use crate::error::ApiError;
use crate::services::UsersService;
use crate::upload::{read_image, save_image};
use actix_multipart::Multipart;
use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use mongodb::bson::oid::ObjectId;
use tracing::{info, warn};

#[tracing::instrument(name = "GET /users/{id} - Returns a single user", skip(service, _user))]
#[get("/users/{id}")]
pub async fn get_user(
    service: Data<UsersService>,
    _user: AuthUser,
    id: Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&id)?;
    let user = service.get_user_by_id(&user_id).await?;
    Ok(Json(user.into()))
}

#[tracing::instrument(name = "GET /users - Lists users page by page", skip(service, _admin))]
#[get("/users")]
pub async fn get_users(
    service: Data<UsersService>,
    _admin: AdminUser,
    query: Query<UsersQuery>,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    let (filter, paginate) = query.into_inner().split();
    let page = service.get_users(&filter, paginate).await?;

    Ok(Json(PageResponse {
        data: page.data.into_iter().map(UserResponse::from).collect(),
        count: page.count,
    }))
}

#[tracing::instrument(
    name = "POST /users - Creates a user on behalf of an admin",
    skip_all,
    fields(admin_id = %admin.0.user_id, email = %req_data.email)
)]
#[post("/users")]
pub async fn create_user(
    service: Data<UsersService>,
    admin: AdminUser,
    req_data: Json<CreateUserDto>,
) -> Result<HttpResponse, ApiError> {
    let user = service.create_user(req_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[tracing::instrument(
    name = "PUT /users - Updates the caller's profile",
    skip_all,
    fields(user_id = %user.0.user_id)
)]
#[put("/users")]
pub async fn update_user(
    service: Data<UsersService>,
    user: AuthUser,
    req_data: Json<UpdateUserDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&user.0.user_id)?;
    let user = service.update_user(&user_id, req_data.into_inner()).await?;
    Ok(Json(user.into()))
}

#[tracing::instrument(
    name = "PUT /users/update_password - Changes the caller's password",
    skip_all,
    fields(user_id = %user.0.user_id)
)]
#[put("/users/update_password")]
pub async fn update_user_password(
    service: Data<UsersService>,
    user: AuthUser,
    req_data: Json<UpdateUserPasswordDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&user.0.user_id)?;
    let user = service
        .update_user_password(&user_id, req_data.into_inner())
        .await?;
    Ok(Json(user.into()))
}

#[tracing::instrument(
    name = "PUT /users/admin/{id} - Updates any user on behalf of an admin",
    skip_all,
    fields(admin_id = %admin.0.user_id, id = %id)
)]
#[put("/users/admin/{id}")]
pub async fn update_user_admin(
    service: Data<UsersService>,
    admin: AdminUser,
    id: Path<String>,
    req_data: Json<UpdateUserByAdminDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&id)?;
    let user = service
        .update_user_by_admin(&user_id, req_data.into_inner())
        .await?;
    Ok(Json(user.into()))
}

async fn store_image(
    service: &UsersService,
    uploads: &UploadConfig,
    user_id: &ObjectId,
    payload: Multipart,
) -> Result<UserResponse, ApiError> {
    // make sure the user exists before anything touches the disk
    service.get_user_by_id(user_id).await?;

    let image = read_image(payload, uploads.max_bytes).await?;
    let path = save_image(&uploads.dir, &image).await?;
    info!("Stored image at {}", path);

    Ok(service.set_user_image(user_id, &path).await?.into())
}

#[tracing::instrument(
    name = "PUT /users/set_image/{id} - Replaces the caller's image",
    skip_all,
    fields(user_id = %user.0.user_id, id = %id)
)]
#[put("/users/set_image/{id}")]
pub async fn set_image(
    service: Data<UsersService>,
    uploads: Data<UploadConfig>,
    user: AuthUser,
    id: Path<String>,
    payload: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&id)?;
    if user_id.to_hex() != user.0.user_id {
        warn!("Attempt to set the image of another user");
        return Err(ApiError::Forbidden("Can't access this route.".to_string()));
    }

    let user = store_image(&service, &uploads, &user_id, payload).await?;
    Ok(Json(user))
}

#[tracing::instrument(
    name = "PUT /users/set_image_admin/{id} - Replaces any user's image on behalf of an admin",
    skip_all,
    fields(admin_id = %admin.0.user_id, id = %id)
)]
#[put("/users/set_image_admin/{id}")]
pub async fn set_image_admin(
    service: Data<UsersService>,
    uploads: Data<UploadConfig>,
    admin: AdminUser,
    id: Path<String>,
    payload: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_object_id(&id)?;
    let user = store_image(&service, &uploads, &user_id, payload).await?;
    Ok(Json(user))
}

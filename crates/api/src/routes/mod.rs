// routes/mod.rs - HTTP surface of the accounts API

use super::error::ApiError;
use actix_web::web::ServiceConfig;
use mongodb::bson::oid::ObjectId;

pub mod auth;
pub mod users;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(auth::signup)
        .service(auth::login)
        .service(auth::forgot_password)
        .service(auth::refresh)
        .service(auth::logout)
        .service(users::update_user_password)
        .service(users::update_user_admin)
        .service(users::set_image)
        .service(users::set_image_admin)
        .service(users::get_users)
        .service(users::create_user)
        .service(users::update_user)
        .service(users::get_user);
}

pub(crate) fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid id.".to_string()))
}

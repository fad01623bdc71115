// services/users.rs - CRUD on the user resource

use database::{
    users::{UserFilter, UserModel, UserStore, UserUpdate},
    HashService, Page, Paginate,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{CreateUserDto, UpdateUserByAdminDto, UpdateUserDto, UpdateUserPasswordDto};
use crate::error::ServiceError;

pub struct UsersService {
    users: Arc<dyn UserStore>,
    hash: HashService,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>, hash: HashService) -> Self {
        Self { users, hash }
    }

    pub async fn get_user_by_id(&self, user_id: &ObjectId) -> Result<UserModel, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserModel, ServiceError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn get_users(
        &self,
        filter: &UserFilter,
        paginate: Paginate,
    ) -> Result<Page<UserModel>, ServiceError> {
        Ok(self.users.find_page(filter, paginate).await?)
    }

    #[instrument(skip_all, fields(email = %dto.email))]
    pub async fn create_user(&self, dto: CreateUserDto) -> Result<UserModel, ServiceError> {
        dto.validate()?;

        let password = self.hash.hash_data(&dto.password).await?;
        let mut user = UserModel::new(&dto.email, password, &dto.first_name, &dto.last_name);
        user.phone = dto.phone;
        user.is_admin = dto.is_admin;

        let user = self.users.create(user).await?;
        info!(user_id = %user.id, is_admin = user.is_admin, "User created");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        user_id: &ObjectId,
        dto: UpdateUserDto,
    ) -> Result<UserModel, ServiceError> {
        let update = UserUpdate {
            first_name: dto.first_name,
            last_name: dto.last_name,
            phone: dto.phone,
            device_token: dto.device_token,
            ..Default::default()
        };
        self.apply(user_id, update).await
    }

    #[instrument(skip(self, dto))]
    pub async fn update_user_password(
        &self,
        user_id: &ObjectId,
        dto: UpdateUserPasswordDto,
    ) -> Result<UserModel, ServiceError> {
        dto.validate()?;

        let user = self.get_user_by_id(user_id).await?;
        if !self.hash.is_match_hashed(&user.password, &dto.old_password).await? {
            warn!("Password change attempted with a wrong current password");
            return Err(ServiceError::Unauthorized("Invalid password."));
        }

        let update = UserUpdate {
            password: Some(self.hash.hash_data(&dto.new_password).await?),
            ..Default::default()
        };
        let user = self.apply(user_id, update).await?;
        info!("Password changed");
        Ok(user)
    }

    #[instrument(skip(self, dto))]
    pub async fn update_user_by_admin(
        &self,
        user_id: &ObjectId,
        dto: UpdateUserByAdminDto,
    ) -> Result<UserModel, ServiceError> {
        dto.validate()?;

        let update = UserUpdate {
            email: dto.email,
            first_name: dto.first_name,
            last_name: dto.last_name,
            phone: dto.phone,
            is_admin: dto.is_admin,
            ..Default::default()
        };
        self.apply(user_id, update).await
    }

    pub async fn set_user_image(
        &self,
        user_id: &ObjectId,
        path: &str,
    ) -> Result<UserModel, ServiceError> {
        let update = UserUpdate {
            image: Some(path.to_string()),
            ..Default::default()
        };
        self.apply(user_id, update).await
    }

    async fn apply(&self, user_id: &ObjectId, update: UserUpdate) -> Result<UserModel, ServiceError> {
        // nothing to write, `updatedAt` stays as is
        if update.is_empty() {
            return self.get_user_by_id(user_id).await;
        }

        self.users
            .update(user_id, &update)
            .await?
            .ok_or(ServiceError::NotFound)
    }
}

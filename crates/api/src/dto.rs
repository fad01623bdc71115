// dto.rs - Request bodies and response shapes exchanged with clients

use database::{users::UserModel, users::UserFilter, Paginate};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpDto {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password should not be empty"))]
    pub password: String,
    #[validate(length(min = 1, message = "firstName should not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName should not be empty"))]
    pub last_name: String,
    pub phone: Option<String>,
    pub device_token: Option<String>,
    #[validate(length(min = 1, message = "deviceName should not be empty"))]
    pub device_name: String,
}

// Email format is not checked here so a malformed address fails like any unknown one
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    #[validate(length(min = 1, message = "email should not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "password should not be empty"))]
    pub password: String,
    #[validate(length(min = 1, message = "deviceName should not be empty"))]
    pub device_name: String,
    pub device_token: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordDto {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 1, message = "otp should not be empty"))]
    pub otp: String,
    #[validate(length(min = 1, message = "newPassword should not be empty"))]
    pub new_password: String,
    #[validate(length(min = 1, message = "deviceName should not be empty"))]
    pub device_name: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password should not be empty"))]
    pub password: String,
    #[validate(length(min = 1, message = "firstName should not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName should not be empty"))]
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserByAdminDto {
    #[validate(email(message = "email must be an email"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPasswordDto {
    #[validate(length(min = 1, message = "oldPassword should not be empty"))]
    pub old_password: String,
    #[validate(length(min = 1, message = "newPassword should not be empty"))]
    pub new_password: String,
}

/// Query string of `GET /users`: paging plus filter fields
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

impl UsersQuery {
    pub fn split(self) -> (UserFilter, Paginate) {
        let paginate = Paginate::new(self.page_number, self.page_size);
        let filter = UserFilter {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            is_admin: self.is_admin,
        };
        (filter, paginate)
    }
}

/// A user as clients see it. The password hash is left out.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub device_token: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            image: user.image,
            device_token: user.device_token,
            is_admin: user.is_admin,
            created_at: user.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: user.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JwtPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User plus a fresh token pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: JwtPair,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PasswordResetResponse {
    pub msg: String,
    #[serde(flatten)]
    pub tokens: JwtPair,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    fn create_dto(email: &str) -> CreateUserDto {
        CreateUserDto {
            email: email.to_string(),
            password: "p1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            is_admin: false,
        }
    }

    #[test]
    fn auth_response_is_flat_camel_case() {
        let user = UserModel::new("a@x.com", "secret-hash".to_string(), "Ada", "Lovelace");
        let response = AuthResponse {
            user: user.into(),
            tokens: JwtPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert!(json.get("password").is_none());
        assert!(json["_id"].is_string());
    }

    #[test]
    fn signup_requires_an_email_address() {
        let dto = SignUpDto {
            email: "not-an-email".to_string(),
            password: "p1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            device_token: None,
            device_name: "phone".to_string(),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(matches!(
            ServiceError::from(errors),
            ServiceError::Validation(_)
        ));
    }

    #[test]
    fn email_needs_a_real_domain() {
        let mut dto = create_dto("a@b.");
        assert!(dto.validate().is_err());

        dto.email = "a@b.com".to_string();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        let mut dto = create_dto("a@b.com");
        dto.first_name = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn admin_update_checks_email_only_when_present() {
        assert!(UpdateUserByAdminDto::default().validate().is_ok());

        let dto = UpdateUserByAdminDto {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn query_splits_into_filter_and_page() {
        let query = UsersQuery {
            page_number: Some(2),
            page_size: Some(10),
            is_admin: Some(true),
            ..Default::default()
        };

        let (filter, paginate) = query.split();
        assert_eq!(filter, UserFilter::admins());
        assert_eq!(paginate.window(), Some((10, 10)));
    }
}

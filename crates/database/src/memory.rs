// database/memory.rs - in-process stores with the same invariants as the MongoDB ones

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::auth::{RefreshTokenModel, RefreshTokenStore};
use crate::codes::{CodeStore, VerificationCodeModel};
use crate::users::{UserFilter, UserModel, UserStore, UserUpdate};
use crate::{DatabaseError, Page, Paginate};

#[derive(Debug, Default)]
pub struct MemoryUsers {
    // insertion order is kept so pages are stable
    users: Mutex<Vec<UserModel>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserModel>, DatabaseError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, DatabaseError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<UserModel>, DatabaseError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| filter.matches(u)).cloned().collect())
    }

    async fn find_page(
        &self,
        filter: &UserFilter,
        paginate: Paginate,
    ) -> Result<Page<UserModel>, DatabaseError> {
        let users = self.users.lock().unwrap();
        let matching: Vec<&UserModel> = users.iter().filter(|u| filter.matches(u)).collect();
        let count = matching.len() as u64;

        let data = match paginate.window() {
            Some((limit, skip)) => matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            None => matching.into_iter().cloned().collect(),
        };

        Ok(Page { data, count })
    }

    async fn create(&self, user: UserModel) -> Result<UserModel, DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email || u.id == user.id) {
            return Err(DatabaseError::DuplicateKey);
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: &ObjectId,
        update: &UserUpdate,
    ) -> Result<Option<UserModel>, DatabaseError> {
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &update.email {
            if users.iter().any(|u| u.email == *email && u.id != *id) {
                return Err(DatabaseError::DuplicateKey);
            }
        }

        Ok(users.iter_mut().find(|u| u.id == *id).map(|user| {
            update.apply(user, DateTime::now());
            user.clone()
        }))
    }
}

#[derive(Debug, Default)]
pub struct MemoryCodes {
    codes: Mutex<Vec<VerificationCodeModel>>,
}

impl MemoryCodes {
    fn newest_active<F>(&self, predicate: F) -> Option<VerificationCodeModel>
    where
        F: Fn(&VerificationCodeModel) -> bool,
    {
        let now = DateTime::now();
        let codes = self.codes.lock().unwrap();
        codes
            .iter()
            .filter(|c| c.is_active(now) && predicate(c))
            .max_by_key(|c| c.created_at)
            .cloned()
    }
}

#[async_trait]
impl CodeStore for MemoryCodes {
    async fn find_active_code(
        &self,
        email: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError> {
        Ok(self.newest_active(|c| c.email == email))
    }

    async fn find_code_by_email_and_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<Option<VerificationCodeModel>, DatabaseError> {
        Ok(self.newest_active(|c| c.email == email && c.otp == otp))
    }

    async fn insert_code(
        &self,
        code: VerificationCodeModel,
    ) -> Result<VerificationCodeModel, DatabaseError> {
        self.codes.lock().unwrap().push(code.clone());
        Ok(code)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRefreshTokens {
    tokens: Mutex<HashMap<(ObjectId, String), RefreshTokenModel>>, // key: (user_id, device_name)
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokens {
    async fn get_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<Option<RefreshTokenModel>, DatabaseError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.get(&(*user_id, device_name.to_string())).cloned())
    }

    async fn update_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
        hashed_token: &str,
    ) -> Result<(), DatabaseError> {
        let record = RefreshTokenModel {
            user_id: *user_id,
            device_name: device_name.to_string(),
            refresh_token: hashed_token.to_string(),
            updated_at: DateTime::now(),
        };
        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert((*user_id, device_name.to_string()), record);
        Ok(())
    }

    async fn delete_refresh_token(
        &self,
        user_id: &ObjectId,
        device_name: &str,
    ) -> Result<bool, DatabaseError> {
        let mut tokens = self.tokens.lock().unwrap();
        Ok(tokens.remove(&(*user_id, device_name.to_string())).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> UserModel {
        UserModel::new(email, "hash".to_string(), "First", "Last")
    }

    #[tokio::test]
    async fn duplicate_email_is_a_duplicate_key() {
        let store = MemoryUsers::default();
        store.create(user("a@x.com")).await.unwrap();

        let err = store.create(user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateKey));
    }

    #[tokio::test]
    async fn page_count_ignores_the_slice() {
        let store = MemoryUsers::default();
        for i in 0..25 {
            store.create(user(&format!("u{i}@x.com"))).await.unwrap();
        }

        let page = store
            .find_page(&UserFilter::default(), Paginate::new(Some(2), Some(10)))
            .await
            .unwrap();
        assert_eq!(page.count, 25);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].email, "u10@x.com");

        let last = store
            .find_page(&UserFilter::default(), Paginate::new(Some(3), Some(10)))
            .await
            .unwrap();
        assert_eq!(last.count, 25);
        assert_eq!(last.data.len(), 5);

        let everything = store
            .find_page(&UserFilter::default(), Paginate::default())
            .await
            .unwrap();
        assert_eq!(everything.data.len(), 25);

        let far = store
            .find_page(&UserFilter::default(), Paginate::new(Some(u64::MAX), Some(10)))
            .await
            .unwrap();
        assert_eq!(far.count, 25);
        assert!(far.data.is_empty());
    }

    #[tokio::test]
    async fn update_returns_the_new_document() {
        let store = MemoryUsers::default();
        let created = store.create(user("a@x.com")).await.unwrap();
        let update = UserUpdate {
            first_name: Some("Grace".to_string()),
            ..Default::default()
        };

        let updated = store.update(&created.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.first_name, "Grace");
        assert!(store.update(&ObjectId::new(), &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_codes_are_not_found() {
        let store = MemoryCodes::default();
        store
            .insert_code(VerificationCodeModel::new("a@x.com", "111111", 0).unwrap())
            .await
            .unwrap();
        assert!(store.find_active_code("a@x.com").await.unwrap().is_none());

        store
            .insert_code(VerificationCodeModel::new("a@x.com", "222222", 600).unwrap())
            .await
            .unwrap();
        assert!(store.find_active_code("a@x.com").await.unwrap().is_some());
        assert!(store
            .find_code_by_email_and_otp("a@x.com", "111111")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_code_by_email_and_otp("a@x.com", "222222")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn one_refresh_token_per_device() {
        let store = MemoryRefreshTokens::default();
        let user_id = ObjectId::new();

        store.update_refresh_token(&user_id, "phone", "h1").await.unwrap();
        store.update_refresh_token(&user_id, "phone", "h2").await.unwrap();
        store.update_refresh_token(&user_id, "laptop", "h3").await.unwrap();

        let phone = store.get_refresh_token(&user_id, "phone").await.unwrap().unwrap();
        assert_eq!(phone.refresh_token, "h2");

        assert!(store.delete_refresh_token(&user_id, "phone").await.unwrap());
        assert!(!store.delete_refresh_token(&user_id, "phone").await.unwrap());
        assert!(store.get_refresh_token(&user_id, "laptop").await.unwrap().is_some());
    }
}

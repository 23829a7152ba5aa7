//! In-memory storage for tests and single-process development.
//!
//! Data is lost on restart and not shared between processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use ticketing_core::ObjectId;

use super::{CredentialStore, RefreshTokenStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{RefreshToken, User};

#[derive(Default)]
struct Users {
    by_id: HashMap<ObjectId, User>,
    id_by_phone: HashMap<String, ObjectId>,
}

/// In-memory users and refresh tokens.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Users>,
    refresh_tokens: Mutex<HashMap<String, RefreshToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().by_id.len()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.lock().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock();

        if users.id_by_phone.contains_key(&user.phone) {
            return Err(StoreError::Duplicate("phone".to_string()));
        }
        users.id_by_phone.insert(user.phone.clone(), user.id);
        users.by_id.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock();
        Ok(users
            .id_by_phone
            .get(phone)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.lock().by_id.get(&id).cloned())
    }

    async fn add_event(&self, user_id: ObjectId, event_id: ObjectId) -> StoreResult<bool> {
        let mut users = self.users.lock();
        match users.by_id.get_mut(&user_id) {
            Some(user) => {
                if !user.events.contains(&event_id) {
                    user.events.push(event_id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()> {
        let mut tokens = self.refresh_tokens.lock();

        if tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Duplicate("refresh token".to_string()));
        }
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(self.refresh_tokens.lock().remove(token_hash))
    }

    async fn delete(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(self.refresh_tokens.lock().remove(token_hash).is_some())
    }

    async fn delete_for_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        let mut tokens = self.refresh_tokens.lock();
        let before = tokens.len();
        tokens.retain(|_, token| token.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tokens = self.refresh_tokens.lock();
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}

//! Persistence seams for the session core.
//!
//! Two capability sets, each with an in-memory and a SQLite backend:
//! - [`CredentialStore`]: user records, unique by phone
//! - [`RefreshTokenStore`]: outstanding refresh tokens, single use
//!
//! Backends implement small primitives; the refresh token protocol
//! (issue / redeem / revoke) is written once on top of them.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ticketing_core::ObjectId;

use crate::error::StoreResult;
use crate::model::{RefreshToken, User};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Fails with `StoreError::Duplicate` when the phone is taken.
    async fn create(&self, user: &User) -> StoreResult<()>;

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<User>>;

    /// Append an event to the user's event list. Returns false for an unknown user.
    async fn add_event(&self, user_id: ObjectId, event_id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()>;

    /// Atomically find and remove the record with this hash.
    ///
    /// Of any number of concurrent calls for the same hash, at most one
    /// may observe `Some`.
    async fn take(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    async fn delete(&self, token_hash: &str) -> StoreResult<bool>;

    async fn delete_for_user(&self, user_id: ObjectId) -> StoreResult<u64>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Mint, persist and return a new refresh token value for the user
    async fn issue(&self, user_id: ObjectId, ttl: Duration) -> StoreResult<String> {
        let (value, record) = RefreshToken::generate(user_id, ttl);
        self.insert(&record).await?;
        Ok(value)
    }

    /// Consume a token value.
    ///
    /// The record is gone once this returns, whatever the outcome.
    /// Unknown, expired and already-consumed values all yield `None`.
    async fn redeem(&self, value: &str) -> StoreResult<Option<ObjectId>> {
        let Some(record) = self.take(&RefreshToken::hash_value(value)).await? else {
            return Ok(None);
        };

        if record.is_expired_at(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(record.user_id))
    }

    /// Invalidate a single token value. Idempotent.
    async fn revoke(&self, value: &str) -> StoreResult<bool> {
        self.delete(&RefreshToken::hash_value(value)).await
    }

    /// Invalidate every outstanding token of the user
    async fn revoke_all(&self, user_id: ObjectId) -> StoreResult<u64> {
        self.delete_for_user(user_id).await
    }
}

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use ticketing_core::ObjectId;

use crate::error::AuthError;

/// Number of random bytes behind a refresh token value.
const REFRESH_TOKEN_BYTES: usize = 32;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::Validation(format!("unknown role `{}`", other))),
        }
    }
}

/// Registration input, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub phone: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub university: Option<ObjectId>,
}

impl NewUser {
    /// Reject missing or malformed mandatory fields
    pub fn validate(&self) -> Result<(), AuthError> {
        if !is_valid_phone(&self.phone) {
            return Err(AuthError::Validation(
                "phone must be 7 to 15 digits with an optional leading +".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if self.first_name.trim().is_empty() {
            return Err(AuthError::Validation("firstName is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(AuthError::Validation("lastName is required".to_string()));
        }
        Ok(())
    }
}

/// Phone numbers are E.164-like: optional `+`, then 7 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Stored user record. Only ever leaves the service as a [`UserProfile`].
#[derive(Clone)]
pub struct User {
    pub id: ObjectId,
    pub phone: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub university: Option<ObjectId>,
    pub events: Vec<ObjectId>,
    pub purchases: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh record from validated input and an already computed hash
    pub fn new(input: NewUser, password_hash: String, role: Role) -> Self {
        Self {
            id: ObjectId::new(),
            phone: input.phone,
            password_hash,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            role,
            university: input.university,
            events: Vec::new(),
            purchases: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            phone: self.phone.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            university: self.university,
            events: self.events.clone(),
            purchases: self.purchases.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("phone", &self.phone)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Public projection of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub university: Option<ObjectId>,
    pub events: Vec<ObjectId>,
    pub purchases: Vec<ObjectId>,
}

/// Identity asserted by a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: ObjectId,
    pub role: Role,
}

impl Identity {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Persisted refresh token record.
///
/// Only the SHA-256 digest of the token value is kept; the value itself is
/// handed to the client once and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token_hash: String,
    pub user_id: ObjectId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Mint a new random token value and the record that tracks it
    pub fn generate(user_id: ObjectId, ttl: Duration) -> (String, Self) {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let value = URL_SAFE_NO_PAD.encode(bytes);

        let issued_at = Utc::now();
        let record = Self {
            token_hash: Self::hash_value(&value),
            user_id,
            issued_at,
            expires_at: issued_at + ttl,
        };
        (value, record)
    }

    pub fn hash_value(value: &str) -> String {
        hex::encode(Sha256::digest(value.as_bytes()))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

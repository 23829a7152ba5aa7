// Core modules
mod error;
mod jwt;
mod password;

pub mod model;
pub mod service;
pub mod store;

// Re-export error types
pub use error::{AuthError, Result, StoreError, StoreResult};

// Re-export crypto primitives
pub use jwt::{Claims, TokenCodec};
pub use password::{HashCost, PasswordHasher};

pub use model::{Identity, NewUser, RefreshToken, Role, Session, TokenPair, User, UserProfile};
pub use service::{AuthService, SessionSettings};
pub use store::{CredentialStore, MemoryStore, RefreshTokenStore, SqliteStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AuthError, AuthService, Identity, NewUser, Result, Role, Session, SessionSettings,
        TokenPair, UserProfile,
    };
}

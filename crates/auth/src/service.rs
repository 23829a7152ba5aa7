use chrono::{Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use ticketing_core::ObjectId;
use tracing::{debug, info, warn};

use crate::{
    error::{AuthError, Result, StoreError, StoreResult},
    jwt::TokenCodec,
    model::{is_valid_phone, Identity, NewUser, Role, Session, TokenPair, User, UserProfile},
    password::{HashCost, PasswordHasher},
    store::{CredentialStore, RefreshTokenStore},
};

/// Tunables for [`AuthService`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Seconds of clock skew tolerated on access token expiry
    pub clock_skew_seconds: u64,
    /// Upper bound on any single store call
    pub store_timeout: std::time::Duration,
    pub hash_cost: HashCost,
}

impl SessionSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            clock_skew_seconds: 0,
            store_timeout: std::time::Duration::from_secs(5),
            hash_cost: HashCost::default(),
        }
    }
}

/// Registration, login, refresh-token rotation and access token checks.
///
/// Holds no per-session state of its own: everything lives in the stores,
/// so one instance is shared by all request handlers.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    refresh_token_ttl: Duration,
    store_timeout: std::time::Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        settings: SessionSettings,
    ) -> Result<Self> {
        let codec = TokenCodec::new(
            &settings.jwt_secret,
            settings.access_token_ttl,
            settings.clock_skew_seconds,
        )?;
        let hasher = PasswordHasher::new(settings.hash_cost)?;

        Ok(Self {
            users,
            refresh_tokens,
            hasher,
            codec,
            refresh_token_ttl: settings.refresh_token_ttl,
            store_timeout: settings.store_timeout,
        })
    }

    /// Register a new customer
    pub async fn register(&self, input: NewUser) -> Result<UserProfile> {
        self.register_with_role(input, Role::Customer).await
    }

    /// Register a new user with the given role. Issues no tokens.
    pub async fn register_with_role(&self, input: NewUser, role: Role) -> Result<UserProfile> {
        input.validate()?;

        if self.store("find_by_phone", self.users.find_by_phone(&input.phone)).await?.is_some() {
            debug!("registration rejected: phone already registered");
            return Err(AuthError::Conflict("phone already registered".to_string()));
        }

        let password_hash = self.hash_password(input.password.clone()).await?;
        let user = User::new(input, password_hash, role);

        // The store's uniqueness constraint settles races between concurrent registrations
        self.store("create_user", self.users.create(&user)).await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.profile())
    }

    /// Verify credentials and open a session.
    ///
    /// An unknown phone and a wrong password fail identically.
    pub async fn login(&self, phone: &str, password: &str) -> Result<Session> {
        if phone.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("phone and password are required".to_string()));
        }
        if !is_valid_phone(phone) {
            // Still pay for a hash so malformed phones cannot be told apart by timing
            self.burn_verification(password.to_string()).await?;
            return Err(AuthError::Unauthorized);
        }

        let user = self.store("find_by_phone", self.users.find_by_phone(phone)).await?;

        let Some(user) = user else {
            self.burn_verification(password.to_string()).await?;
            debug!("login rejected");
            return Err(AuthError::Unauthorized);
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            debug!("login rejected");
            return Err(AuthError::Unauthorized);
        }

        let tokens = self
            .issue_pair(Identity {
                user_id: user.id,
                role: user.role,
            })
            .await?;

        info!(user_id = %user.id, "user logged in");
        Ok(Session {
            tokens,
            user: user.profile(),
        })
    }

    /// Exchange a refresh token for a brand-new pair.
    ///
    /// The presented token is consumed before anything else happens, so it
    /// is invalid afterwards even if the new pair never reaches the client.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        if refresh_token.is_empty() {
            return Err(AuthError::Validation("refreshToken is required".to_string()));
        }

        let user_id = self
            .store("redeem_refresh_token", self.refresh_tokens.redeem(refresh_token))
            .await?
            .ok_or(AuthError::NotFound)?;

        // The role may have changed since login, so mint from the current record
        let user = self
            .store("find_by_id", self.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "refresh token outlived its user");
                AuthError::NotFound
            })?;

        let tokens = self
            .issue_pair(Identity {
                user_id: user.id,
                role: user.role,
            })
            .await?;

        debug!(user_id = %user.id, "refresh token rotated");
        Ok(tokens)
    }

    /// Validate an access token. No store access.
    pub fn authorize(&self, access_token: &str) -> Result<Identity> {
        self.codec.verify(access_token)
    }

    /// Invalidate one refresh token. Unknown values are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        if refresh_token.is_empty() {
            return Err(AuthError::Validation("refreshToken is required".to_string()));
        }
        self.store("revoke_refresh_token", self.refresh_tokens.revoke(refresh_token))
            .await?;
        Ok(())
    }

    /// Invalidate every refresh token of the user
    pub async fn logout_all(&self, user_id: ObjectId) -> Result<u64> {
        let revoked = self
            .store("revoke_all_refresh_tokens", self.refresh_tokens.revoke_all(user_id))
            .await?;
        info!(user_id = %user_id, revoked, "all sessions revoked");
        Ok(revoked)
    }

    pub async fn find_user(&self, user_id: ObjectId) -> Result<UserProfile> {
        self.store("find_by_id", self.users.find_by_id(user_id))
            .await?
            .map(|user| user.profile())
            .ok_or(AuthError::NotFound)
    }

    /// Record an event on the user's profile
    pub async fn link_event(&self, user_id: ObjectId, event_id: ObjectId) -> Result<()> {
        if self
            .store("add_event", self.users.add_event(user_id, event_id))
            .await?
        {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }

    /// Drop refresh tokens whose lifetime has passed
    pub async fn purge_expired_refresh_tokens(&self) -> Result<u64> {
        let purged = self
            .store("delete_expired", self.refresh_tokens.delete_expired(Utc::now()))
            .await?;
        if purged > 0 {
            info!(purged, "expired refresh tokens removed");
        }
        Ok(purged)
    }

    async fn issue_pair(&self, identity: Identity) -> Result<TokenPair> {
        let access_token = self.codec.issue(identity)?;
        let refresh_token = self
            .store(
                "issue_refresh_token",
                self.refresh_tokens.issue(identity.user_id, self.refresh_token_ttl),
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Bound a store call by the configured timeout
    async fn store<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if !matches!(err, StoreError::Duplicate(_)) {
                    warn!(operation, error = %err, "store call failed");
                }
                Err(err.into())
            }
            Err(_) => {
                warn!(operation, "store call timed out");
                Err(StoreError::Timeout(operation).into())
            }
        }
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Unavailable(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Unavailable(format!("verification task failed: {}", e)))
    }

    async fn burn_verification(&self, password: String) -> Result<()> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&password))
            .await
            .map_err(|e| AuthError::Unavailable(format!("verification task failed: {}", e)))
    }
}

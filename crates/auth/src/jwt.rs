use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use ticketing_core::ObjectId;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::model::{Identity, Role};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Unique token id, so two tokens minted in the same second differ
    pub jti: String,
}

impl Claims {
    pub fn new(identity: Identity, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: identity.user_id.to_string(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Expired once `exp` is no longer strictly in the future, allowing
    /// `leeway` seconds of clock skew.
    pub fn is_expired(&self, leeway: i64) -> bool {
        self.exp + leeway <= Utc::now().timestamp()
    }
}

/// Signs and verifies short-lived access tokens (HS256).
///
/// The signing secret is injected at construction; there is no global key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    leeway: i64,
}

impl TokenCodec {
    /// # Arguments
    /// * `secret` - HMAC secret shared by every instance of the service
    /// * `ttl` - Access token lifetime
    /// * `leeway_seconds` - Clock skew tolerated when checking expiry
    pub fn new(secret: &str, ttl: Duration, leeway_seconds: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::Validation("jwt secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            leeway: leeway_seconds as i64,
        })
    }

    /// Mint an access token for the identity
    pub fn issue(&self, identity: Identity) -> Result<String> {
        let claims = Claims::new(identity, self.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Unavailable(format!("token signing failed: {}", e)))
    }

    /// Validate structure, signature, then expiry.
    ///
    /// Every failure collapses to [`AuthError::Unauthorized`].
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(reason = %e, "access token rejected");
                AuthError::Unauthorized
            })?
            .claims;

        if claims.is_expired(self.leeway) {
            debug!("access token rejected: expired");
            return Err(AuthError::Unauthorized);
        }

        let user_id = claims.sub.parse::<ObjectId>().map_err(|_| AuthError::Unauthorized)?;

        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: ObjectId::new(),
            role,
        }
    }

    fn codec(secret: &str, ttl_seconds: i64) -> TokenCodec {
        TokenCodec::new(secret, Duration::seconds(ttl_seconds), 0).unwrap()
    }

    #[test]
    fn test_token_generation_and_validation() {
        let codec = codec("test_secret", 900);
        let who = identity(Role::Organizer);

        let token = codec.issue(who).unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified, who);
    }

    #[test]
    fn test_invalid_secret() {
        let token = codec("correct_secret", 900).issue(identity(Role::Customer)).unwrap();
        let result = codec("wrong_secret", 900).verify(&token);

        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_expired_token() {
        let codec = codec("test_secret", -10);
        let token = codec.issue(identity(Role::Customer)).unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let lenient = TokenCodec::new("test_secret", Duration::seconds(-5), 60).unwrap();
        let token = lenient.issue(identity(Role::Customer)).unwrap();

        assert!(lenient.verify(&token).is_ok());
    }

    #[test]
    fn test_tampered_token() {
        let codec = codec("test_secret", 900);
        let token = codec.issue(identity(Role::Customer)).unwrap();

        // Swap the payload for one claiming the admin role
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims::new(identity(Role::Admin), Duration::seconds(900));
        let forged_payload = {
            use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap())
        };
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(codec.verify(&forged), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec("test_secret", 900);
        for garbage in ["", "invalid_token", "a.b.c", "Bearer x"] {
            assert!(matches!(codec.verify(garbage), Err(AuthError::Unauthorized)));
        }
    }

    #[test]
    fn test_tokens_differ_within_the_same_second() {
        let codec = codec("test_secret", 900);
        let who = identity(Role::Customer);

        assert_ne!(codec.issue(who).unwrap(), codec.issue(who).unwrap());
    }

    #[test]
    fn test_missing_exp_or_sub_rejected() {
        let codec = codec("test_secret", 900);
        let key = EncodingKey::from_secret(b"test_secret");
        let now = Utc::now().timestamp();
        let user_id = ObjectId::new().to_string();

        let complete = serde_json::json!({
            "sub": user_id,
            "role": "customer",
            "iat": now,
            "exp": now + 900,
            "jti": "a",
        });
        let token = encode(&Header::new(Algorithm::HS256), &complete, &key).unwrap();
        assert!(codec.verify(&token).is_ok());

        for claim in ["exp", "sub"] {
            let mut partial = complete.clone();
            partial.as_object_mut().unwrap().remove(claim);
            let token = encode(&Header::new(Algorithm::HS256), &partial, &key).unwrap();
            assert!(
                matches!(codec.verify(&token), Err(AuthError::Unauthorized)),
                "{}",
                claim
            );
        }
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(identity(Role::Admin), Duration::seconds(3600));

        assert_eq!(claims.role, Role::Admin);
        assert!(!claims.is_expired(0));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new("", Duration::seconds(60), 0).is_err());
    }
}

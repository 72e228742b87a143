//! Password hashing and bearer tokens

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthSettings;
use crate::error::{HappyFeetError, Result};
use crate::logging::redact_token;
use crate::models::User;

/// bcrypt password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| HappyFeetError::Auth(format!("Failed to hash password: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// JWT claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(HappyFeetError::Configuration(
                "JWT secret must not be empty".to_string(),
            ));
        }
        let ttl = Duration::try_hours(ttl_hours)
            .filter(|ttl| ttl_hours > 0 && Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                HappyFeetError::Configuration(
                    "Token lifetime must be a positive number of hours".to_string(),
                )
            })?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        Self::new(&settings.jwt_secret, settings.token_ttl_hours)
    }

    /// Signed token for `user`, valid for the configured lifetime
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| HappyFeetError::Auth("Token lifetime out of range".to_string()))?
                .timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| HappyFeetError::Auth(format!("Failed to sign token: {}", e)))?;
        debug!(user_id = %user.id, token = %redact_token(&token), "Issued session token");
        Ok(token)
    }

    /// Verified claims of `token`. Bad signatures and expired tokens are `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(token = %redact_token(token), "Token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        HappyFeetError::Unauthorized("Token has expired".to_string())
                    }
                    _ => HappyFeetError::Unauthorized("Invalid or expired token".to_string()),
                }
            })
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| HappyFeetError::Unauthorized("No token provided".to_string()))?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(HappyFeetError::Unauthorized("Invalid token format".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationRequest;

    fn user() -> User {
        let request = RegistrationRequest {
            name: "Token Tester".to_string(),
            email: "tokens@example.com".to_string(),
            password: "password123".to_string(),
            username: "tokens".to_string(),
            ..Default::default()
        };
        User::new(&request, String::new()).unwrap()
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(hasher.verify("password123", &hash));
        assert!(!hasher.verify("password124", &hash));
        assert!(!hasher.verify("password123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_token_issue_and_verify() {
        let manager = TokenManager::new("test-secret", 24).unwrap();
        let user = user();
        let token = manager.issue(&user).unwrap();

        let claims = manager.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "tokens@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = TokenManager::new("secret-a", 24).unwrap();
        let verifier = TokenManager::new("secret-b", 24).unwrap();
        let token = issuer.issue(&user()).unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(verifier.verify("garbage").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = TokenManager::new("test-secret", 1).unwrap();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "old@example.com".to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = manager.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(Some("bearer  abc ")).unwrap(), "abc");
        assert!(bearer_token(None).is_err());
        assert!(bearer_token(Some("Bearer")).is_err());
        assert!(bearer_token(Some("Basic abc")).is_err());
    }

    #[test]
    fn test_invalid_manager_settings() {
        assert!(TokenManager::new("", 24).is_err());
        assert!(TokenManager::new("secret", 0).is_err());
        assert!(TokenManager::new("secret", i64::MAX).is_err());
        assert!(TokenManager::new("secret", 1_000_000_000_000).is_err());
    }
}

use crate::error::{AppError, AuthError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest session lifetime accepted from configuration (ten years).
pub const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration time
}

/// Issues and verifies HS256 session tokens. Tokens are stateless: nothing
/// is recorded server-side.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// `expiry_days` is clamped to `1..=MAX_TOKEN_EXPIRY_DAYS`.
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::days(expiry_days.clamp(1, MAX_TOKEN_EXPIRY_DAYS)),
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalError("token expiry out of range".to_string()))?;
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })
    }
}

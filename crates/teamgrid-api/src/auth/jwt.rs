//! JWT signing and verification.
//!
//! HS256 access/refresh token pairs. Verification here only proves the token
//! was issued by us and has not expired; the authentication middleware
//! additionally requires a matching active-session row, so logout revokes
//! tokens before their `exp`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use teamgrid_core::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: Uuid,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies the token pairs issued at login.
#[derive(Clone)]
pub struct TokenFactory {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenFactory {
    pub fn new(secret: &str, access_expiry_hours: i64, refresh_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_expiry: Duration::hours(access_expiry_hours),
            refresh_expiry: Duration::hours(refresh_expiry_hours),
        }
    }

    pub fn sign_access(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign(user_id, TokenType::Access, self.access_expiry)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign(user_id, TokenType::Refresh, self.refresh_expiry)
    }

    pub fn refresh_expiry(&self) -> Duration {
        self.refresh_expiry
    }

    fn sign(
        &self,
        user_id: Uuid,
        token_type: TokenType,
        expiry: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            token_type,
            iat: now.timestamp(),
            exp: (now + expiry).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, and require the expected token type.
    pub fn parse(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token is expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::Unauthorized("Token format is invalid".to_string())
                }
                _ => AppError::Unauthorized(format!("Parse token failed: {}", e)),
            },
        )?;

        if data.claims.token_type != expected {
            return Err(AppError::Unauthorized("Wrong token type".to_string()));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> TokenFactory {
        TokenFactory::new("test-secret", 24, 24 * 7)
    }

    #[test]
    fn test_access_token_roundtrip() {
        let factory = factory();
        let user_id = Uuid::new_v4();
        let token = factory.sign_access(user_id).unwrap();
        let claims = factory.parse(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let factory = factory();
        let token = factory.sign_refresh(Uuid::new_v4()).unwrap();
        let err = factory.parse(&token, TokenType::Access).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let factory = factory();
        assert!(factory.parse("not-a-jwt", TokenType::Access).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = factory().sign_access(Uuid::new_v4()).unwrap();
        let other = TokenFactory::new("other-secret", 24, 24 * 7);
        assert!(other.parse(&token, TokenType::Access).is_err());
    }
}

// HS256 bearer tokens
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use crate::{AppError, Result};
use crate::auth::Claims;

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn expires_at(&self) -> usize {
        (Utc::now() + self.expiry).timestamp().max(0) as usize
    }

    pub fn encode_token(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to sign token: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AppError::AuthError("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_token_roundtrip_and_tamper() {
        let service = JwtService::new("secret", 1);
        let claims = Claims {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            exp: service.expires_at(),
        };
        let token = service.encode_token(&claims).unwrap();
        let decoded = service.decode_token(&token).unwrap();
        assert_eq!(decoded.user_id, claims.user_id);

        let other = JwtService::new("different", 1);
        assert!(matches!(other.decode_token(&token), Err(AppError::AuthError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new("secret", 1);
        let claims = Claims {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = service.encode_token(&claims).unwrap();
        assert!(service.decode_token(&token).is_err());
    }
}

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification of access tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn sign(&self, user_id: Uuid) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat,
            exp: iat + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Subject of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> ApiResult<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                ApiError::invalid_token()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_verifies_to_subject() {
        let keys = TokenKeys::new("secret", 60);
        let id = Uuid::now_v7();
        let token = keys.sign(id).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), id);
    }

    #[test]
    fn foreign_and_expired_tokens_are_unauthorized() {
        let id = Uuid::now_v7();
        let other = TokenKeys::new("other-secret", 60).sign(id).unwrap();
        let keys = TokenKeys::new("secret", 60);
        assert_eq!(keys.verify(&other), Err(ApiError::invalid_token()));

        let expired = TokenKeys::new("secret", -3600).sign(id).unwrap();
        assert_eq!(keys.verify(&expired), Err(ApiError::invalid_token()));
        assert_eq!(keys.verify("not.a.jwt"), Err(ApiError::invalid_token()));
    }
}

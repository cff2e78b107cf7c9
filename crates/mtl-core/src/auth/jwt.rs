//! JWT token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use super::claims::Claims;
use crate::db::unix_timestamp;

/// Token errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("Token has no subject")]
    MissingSubject,
}

/// Manages JWT token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue an access token. Returns the token and its lifetime in seconds.
    pub fn issue(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
    ) -> Result<(String, i64), AuthError> {
        let now = unix_timestamp();
        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(AuthError::Encode)?;
        Ok((token, self.ttl_secs))
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(AuthError::Invalid)?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate() {
        let jwt = test_jwt();
        let (token, ttl) = jwt.issue("user-1", "alice", "alice@example.com").unwrap();
        assert_eq!(ttl, 3600);

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.user_id(), "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_ids_are_unique() {
        let jwt = test_jwt();
        let (a, _) = jwt.issue("user-1", "alice", "a@x.io").unwrap();
        let (b, _) = jwt.issue("user-1", "alice", "a@x.io").unwrap();
        assert_ne!(
            jwt.validate(&a).unwrap().jti,
            jwt.validate(&b).unwrap().jti
        );
    }

    #[test]
    fn invalid_token_fails_validation() {
        let jwt = test_jwt();
        assert!(matches!(
            jwt.validate("not-a-valid-token"),
            Err(AuthError::Invalid(_))
        ));
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret", 3600);

        let (token, _) = jwt1.issue("user-1", "alice", "a@x.io").unwrap();
        assert!(jwt2.validate(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Default validation allows 60s of leeway.
        let jwt = JwtManager::new(b"test-secret-key-for-testing", -120);
        let (token, _) = jwt.issue("user-1", "alice", "a@x.io").unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let jwt = test_jwt();
        let (token, _) = jwt.issue("", "ghost", "g@x.io").unwrap();
        assert!(matches!(
            jwt.validate(&token),
            Err(AuthError::MissingSubject)
        ));
    }
}

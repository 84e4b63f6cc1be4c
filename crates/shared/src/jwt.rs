//! HS256 access tokens for the Docket API.
//!
//! Tokens carry the user id and login name and are issued by `docket`.
//! There are no refresh tokens; clients log in again when one expires.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TOKEN_ISSUER};

/// Signing secret and token lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret.
    pub secret: String,
    /// Lifetime of an access token in seconds.
    pub access_token_expires_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "docket-dev-secret".to_string(),
            access_token_expires_secs: 24 * 60 * 60,
        }
    }
}

/// Why a token could not be issued or accepted.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signing failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Malformed, badly signed, or issued by someone else.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Past its `exp`.
    #[error("token has expired")]
    Expired,
}

/// Issues and checks access tokens.
#[derive(Clone)]
pub struct JwtService {
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("lifetime_secs", &self.lifetime.num_seconds())
            .field("keys", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Builds the signing and validation keys from `config`.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            lifetime: Duration::seconds(config.access_token_expires_secs),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `user_id` valid for the configured lifetime.
    pub fn generate_access_token(&self, user_id: Uuid, username: &str) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, username, Utc::now() + self.lifetime);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Checks signature, issuer and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// [`JwtError::Expired`] for an expired token, [`JwtError::DecodingError`]
    /// for anything else.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(JwtError::Expired),
            Err(e) => Err(JwtError::DecodingError(e.to_string())),
        }
    }

    /// Lifetime reported to clients as `expiresIn`.
    #[must_use]
    pub fn access_token_expires_in(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, lifetime_secs: i64) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            access_token_expires_secs: lifetime_secs,
        })
    }

    #[test]
    fn test_issued_token_validates() {
        let jwt = service("docket-test", 900);
        let user_id = Uuid::new_v4();

        let token = jwt.generate_access_token(user_id, "demo").unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username, "demo");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(jwt.access_token_expires_in(), 900);
    }

    #[test]
    fn test_garbage_is_a_decoding_error() {
        let result = service("docket-test", 900).validate_token("not.a.jwt");
        assert!(matches!(result, Err(JwtError::DecodingError(_))));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = service("someone-else", 900)
            .generate_access_token(Uuid::new_v4(), "demo")
            .unwrap();

        assert!(matches!(
            service("docket-test", 900).validate_token(&token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "demo", Utc::now() + Duration::hours(1));
        claims.iss = "elsewhere".to_string();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"docket-test"),
        )
        .unwrap();

        assert!(matches!(
            service("docket-test", 900).validate_token(&token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let jwt = service("docket-test", -3600);
        let token = jwt.generate_access_token(Uuid::new_v4(), "demo").unwrap();

        assert!(matches!(jwt.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", service("docket-test", 900));
        assert!(!debug.contains("docket-test"));
        assert!(debug.contains("[hidden]"));
    }
}

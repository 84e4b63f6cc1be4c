//! Authentication types for JWT and the login/register endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer stamped into every Docket access token.
pub const TOKEN_ISSUER: &str = "docket";

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, always [`TOKEN_ISSUER`].
    pub iss: String,
    /// Subject (user ID).
    pub sub: Uuid,
    /// Login name, for log context.
    pub username: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, username: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Login request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name (case-insensitive).
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Login name (stored lower-cased).
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Whether the account may sign in.
    pub active: bool,
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Authenticated user.
    pub user: UserView,
    /// Bearer token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, "demo", expires_at);

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username, "demo");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_login_response_is_camel_case() {
        let response = LoginResponse {
            user: UserView {
                id: Uuid::nil(),
                username: "demo".into(),
                name: "Demo".into(),
                phone: "555".into(),
                active: true,
            },
            token: "t".into(),
            expires_in: 60,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["expiresIn"], 60);
        assert_eq!(json["user"]["username"], "demo");
    }
}

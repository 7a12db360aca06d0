use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::TokenResult;

/// Username/password pair for the password grant. Never stored.
#[derive(Deserialize, Validate, ToSchema)]
pub struct AuthRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "user@example.com")]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Token set as returned to callers. Field names are part of the public
/// contract and stay snake_case.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: Option<String>,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 300)]
    pub expires_in: u64,
    #[schema(example = 1800)]
    pub refresh_expires_in: Option<u64>,
}

impl From<TokenResult> for TokenResponse {
    fn from(token: TokenResult) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            refresh_expires_in: token.refresh_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_response_keeps_wire_field_names() {
        let response = TokenResponse::from(TokenResult {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            token_type: "Bearer".into(),
            expires_in: 300,
            refresh_expires_in: Some(1800),
        });

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "access_token": "a",
                "refresh_token": "r",
                "token_type": "Bearer",
                "expires_in": 300,
                "refresh_expires_in": 1800
            })
        );
    }

    #[test]
    fn register_request_requires_valid_email() {
        let bad = RegisterRequest {
            email: "not-an-email".into(),
            password: "p".into(),
        };
        assert!(bad.validate().is_err());

        let good = RegisterRequest {
            email: "a@b.com".into(),
            password: "p".into(),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn auth_request_rejects_empty_password() {
        let req = AuthRequest {
            username: "alice".into(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }
}

//! Token values exchanged with the identity provider.

use serde::Deserialize;
use std::fmt;

/// Token set returned by the identity provider's token endpoint.
///
/// Immutable once received; the gateway hands it to the caller and keeps no
/// copy.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
}

impl fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResult")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

/// Client-credentials token authorizing a single account creation.
///
/// Not `Clone`: `create_account` consumes it, so a token cannot outlive the
/// registration attempt that fetched it.
pub struct AdminToken {
    access_token: String,
}

impl AdminToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keycloak_token_body() {
        let body = r#"{
            "access_token": "eyJhbGciOi",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "refresh_token": "eyJhbGciOr",
            "token_type": "Bearer",
            "not-before-policy": 0,
            "session_state": "a856fb91",
            "scope": "profile email"
        }"#;

        let token: TokenResult = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "eyJhbGciOi");
        assert_eq!(token.refresh_token.as_deref(), Some("eyJhbGciOr"));
        assert_eq!(token.expires_in, 300);
        assert_eq!(token.refresh_expires_in, Some(1800));
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let token = TokenResult {
            access_token: "secret-access".into(),
            refresh_token: Some("secret-refresh".into()),
            token_type: "Bearer".into(),
            expires_in: 60,
            refresh_expires_in: None,
        };
        let rendered = format!("{:?} {:?}", token, AdminToken::new("secret-admin"));
        assert!(!rendered.contains("secret-"));
    }
}

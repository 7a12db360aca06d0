//! Entry point used by the HTTP handlers.
//!
//! Token issuance is always available. Registration is an optional
//! capability: a gateway built without a [`RegistrationService`] never needs
//! the admin client or the directory.

use std::sync::Arc;

use super::error::ClassifiedError;
use super::registration::RegistrationService;
use super::token_client::TokenProvider;
use crate::models::TokenResult;

#[derive(Clone)]
pub struct IdentityGateway {
    tokens: Arc<dyn TokenProvider>,
    registration: Option<RegistrationService>,
}

impl IdentityGateway {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            tokens,
            registration: None,
        }
    }

    pub fn with_registration(mut self, registration: RegistrationService) -> Self {
        self.registration = Some(registration);
        self
    }

    pub async fn obtain_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResult, ClassifiedError> {
        self.tokens.obtain_token(username, password).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResult, ClassifiedError> {
        self.tokens.refresh_token(refresh_token).await
    }

    pub fn registration(&self) -> Option<&RegistrationService> {
        self.registration.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registration::tests::{FakeDirectory, FakeIdp};
    use async_trait::async_trait;

    struct StaticTokens;

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn obtain_token(
            &self,
            username: &str,
            _password: &str,
        ) -> Result<TokenResult, ClassifiedError> {
            Ok(TokenResult {
                access_token: format!("access-{}", username),
                refresh_token: Some("refresh".into()),
                token_type: "Bearer".into(),
                expires_in: 300,
                refresh_expires_in: Some(1800),
            })
        }

        async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResult, ClassifiedError> {
            self.obtain_token(refresh_token, "").await
        }
    }

    #[tokio::test]
    async fn token_only_gateway_has_no_registration() {
        let gateway = IdentityGateway::new(Arc::new(StaticTokens));

        assert!(gateway.registration().is_none());
        let token = gateway.obtain_token("alice", "pw").await.unwrap();
        assert_eq!(token.access_token, "access-alice");
        let refreshed = gateway.refresh_token("r1").await.unwrap();
        assert_eq!(refreshed.access_token, "access-r1");
    }

    #[tokio::test]
    async fn registration_capability_is_attached() {
        let gateway = IdentityGateway::new(Arc::new(StaticTokens)).with_registration(
            RegistrationService::new(
                Arc::new(FakeIdp::default()),
                Arc::new(FakeDirectory::default()),
            ),
        );

        let registration = gateway.registration().expect("registration enabled");
        registration.register("a@b.com", "p").await.unwrap();
    }
}

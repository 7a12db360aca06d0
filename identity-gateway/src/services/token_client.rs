//! Password and refresh grants against the identity provider token endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::error::ClassifiedError;
use super::http::{expect_success, malformed, send};
use crate::config::KeycloakConfig;
use crate::models::TokenResult;

const UPSTREAM: &str = "idp_token";

/// Issues end-user tokens. No retries: a failed call is reported as is.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// `grant_type=password`.
    async fn obtain_token(&self, username: &str, password: &str)
        -> Result<TokenResult, ClassifiedError>;

    /// `grant_type=refresh_token`, classified exactly like the password grant.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResult, ClassifiedError>;
}

#[derive(Clone)]
pub struct KeycloakTokenClient {
    client: Client,
    token_endpoint: String,
    client_id: String,
    client_secret: Secret<String>,
}

impl KeycloakTokenClient {
    pub fn new(client: Client, config: &KeycloakConfig) -> Self {
        tracing::info!(
            token_endpoint = %config.token_endpoint,
            client_id = %config.client_id,
            "Keycloak token client configured"
        );

        Self {
            client,
            token_endpoint: config.token_endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    async fn request_token(
        &self,
        grant_type: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResult, ClassifiedError> {
        let mut form = vec![
            ("grant_type", grant_type),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
        ];
        form.extend_from_slice(params);

        let request = self.client.traced_post(&self.token_endpoint).form(&form);
        let response = expect_success(UPSTREAM, send(request, UPSTREAM).await?)?;

        match serde_json::from_str::<TokenResult>(&response.body) {
            Ok(token) => Ok(token),
            Err(e) => Err(malformed(UPSTREAM, response, e)),
        }
    }
}

#[async_trait]
impl TokenProvider for KeycloakTokenClient {
    #[instrument(skip(self, password), fields(username = %username))]
    async fn obtain_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResult, ClassifiedError> {
        tracing::info!("Obtaining token");
        self.request_token("password", &[("username", username), ("password", password)])
            .await
    }

    #[instrument(skip_all)]
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResult, ClassifiedError> {
        tracing::info!("Refreshing token");
        self.request_token("refresh_token", &[("refresh_token", refresh_token)])
            .await
    }
}

//! Privileged identity provider operations: client-credentials token and
//! account creation through the admin REST API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::error::ClassifiedError;
use super::http::{expect_success, malformed, send};
use crate::config::KeycloakConfig;
use crate::models::AdminToken;

const TOKEN_UPSTREAM: &str = "idp_admin_token";
const CREATE_UPSTREAM: &str = "idp_create_account";

#[async_trait]
pub trait IdpAdmin: Send + Sync {
    /// Fetch a fresh client-credentials token. Never cached.
    async fn fetch_admin_token(&self) -> Result<AdminToken, ClassifiedError>;

    /// Create an account whose username is `email`. Consumes the token.
    async fn create_account(
        &self,
        admin_token: AdminToken,
        email: &str,
        password: &str,
    ) -> Result<(), ClassifiedError>;
}

#[derive(Serialize)]
struct UserRepresentation<'a> {
    email: &'a str,
    username: &'a str,
    credentials: Vec<CredentialRepresentation<'a>>,
}

#[derive(Serialize)]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    temporary: bool,
}

impl<'a> UserRepresentation<'a> {
    fn with_password(email: &'a str, password: &'a str) -> Self {
        Self {
            email,
            username: email,
            credentials: vec![CredentialRepresentation {
                kind: "password",
                value: password,
                temporary: false,
            }],
        }
    }
}

#[derive(Deserialize)]
struct ClientCredentialsResponse {
    access_token: Option<String>,
}

#[derive(Clone)]
pub struct KeycloakAdminClient {
    client: Client,
    admin_token_endpoint: String,
    user_registration_endpoint: String,
    client_id: String,
    client_secret: Secret<String>,
}

impl KeycloakAdminClient {
    pub fn new(client: Client, config: &KeycloakConfig) -> Self {
        let admin_token_endpoint = config.admin_token_endpoint();

        tracing::info!(
            admin_token_endpoint = %admin_token_endpoint,
            user_registration_endpoint = %config.user_registration_endpoint,
            "Keycloak admin client configured"
        );

        Self {
            client,
            admin_token_endpoint,
            user_registration_endpoint: config.user_registration_endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

#[async_trait]
impl IdpAdmin for KeycloakAdminClient {
    #[instrument(skip(self))]
    async fn fetch_admin_token(&self) -> Result<AdminToken, ClassifiedError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
        ];

        let request = self.client.traced_post(&self.admin_token_endpoint).form(&form);
        let response = expect_success(TOKEN_UPSTREAM, send(request, TOKEN_UPSTREAM).await?)?;

        match serde_json::from_str::<ClientCredentialsResponse>(&response.body) {
            Ok(ClientCredentialsResponse {
                access_token: Some(token),
            }) if !token.is_empty() => Ok(AdminToken::new(token)),
            Ok(_) => Err(malformed(TOKEN_UPSTREAM, response, "missing access_token")),
            Err(e) => Err(malformed(TOKEN_UPSTREAM, response, e)),
        }
    }

    #[instrument(skip(self, admin_token, password), fields(email = %email))]
    async fn create_account(
        &self,
        admin_token: AdminToken,
        email: &str,
        password: &str,
    ) -> Result<(), ClassifiedError> {
        tracing::info!("Creating account in identity provider");

        let request = self
            .client
            .traced_post(&self.user_registration_endpoint)
            .bearer_auth(admin_token.secret())
            .json(&UserRepresentation::with_password(email, password));

        expect_success(CREATE_UPSTREAM, send(request, CREATE_UPSTREAM).await?)?;
        Ok(())
    }
}

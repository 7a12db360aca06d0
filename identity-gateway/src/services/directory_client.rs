//! Client for the downstream user directory service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::error::ClassifiedError;
use super::http::{expect_success, malformed, send};
use crate::config::DirectoryConfig;
use crate::models::UserRecord;

const CREATE_UPSTREAM: &str = "directory_create_user";
const LOOKUP_UPSTREAM: &str = "directory_get_user";

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn create_user(&self, email: &str, username: &str) -> Result<UserRecord, ClassifiedError>;

    /// `Ok(None)` when the directory has no user with this email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, ClassifiedError>;
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    username: &'a str,
}

/// Lenient view of the create response. Every field may be absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedUserBody {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Clone)]
pub struct HttpDirectoryClient {
    client: Client,
    base_url: Url,
}

impl HttpDirectoryClient {
    pub fn new(client: Client, config: &DirectoryConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid USER_SERVICE_URL: {}", e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "USER_SERVICE_URL cannot be used as a base URL"
            )));
        }

        tracing::info!(base_url = %base_url, "Directory client configured");

        Ok(Self { client, base_url })
    }

    fn lookup_url(&self, email: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["email", email]);
        }
        url
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    #[instrument(skip(self), fields(email = %email))]
    async fn create_user(&self, email: &str, username: &str) -> Result<UserRecord, ClassifiedError> {
        let request = self
            .client
            .traced_post(self.base_url.as_str())
            .json(&CreateUserBody { email, username });
        let response = expect_success(CREATE_UPSTREAM, send(request, CREATE_UPSTREAM).await?)?;

        // The user exists once the directory answers 2xx; the body only adds the id.
        if response.body.trim().is_empty() {
            return Ok(UserRecord::new(email, username));
        }

        match serde_json::from_str::<CreatedUserBody>(&response.body) {
            Ok(created) => Ok(UserRecord {
                id: created.id,
                email: created.email.unwrap_or_else(|| email.to_string()),
                username: created.username.unwrap_or_else(|| username.to_string()),
            }),
            Err(e) => {
                tracing::warn!(
                    upstream = CREATE_UPSTREAM,
                    status = response.status.as_u16(),
                    error = %e,
                    "Directory accepted the user but its response body could not be read"
                );
                Ok(UserRecord::new(email, username))
            }
        }
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, ClassifiedError> {
        let url = self.lookup_url(email);
        let response = send(self.client.traced_get(url.as_str()), LOOKUP_UPSTREAM).await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = expect_success(LOOKUP_UPSTREAM, response)?;
        match serde_json::from_str(&response.body) {
            Ok(record) => Ok(Some(record)),
            Err(e) => Err(malformed(LOOKUP_UPSTREAM, response, e)),
        }
    }
}

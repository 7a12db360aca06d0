//! Account registration across the identity provider and the directory.
//!
//! Sequence per request, stopping at the first failure:
//!
//! 1. fetch a client-credentials admin token (fresh every time)
//! 2. create the identity provider account, username = email
//! 3. create the directory user, username = email
//!
//! A failure at step 3 leaves the identity provider account in place. There
//! is no rollback and no deduplication: the identity provider's uniqueness
//! constraint is the only guard against registering an email twice.

use std::sync::Arc;
use tracing::instrument;

use super::admin_client::IdpAdmin;
use super::directory_client::DirectoryClient;
use super::error::{ClassifiedError, RegistrationError};
use super::metrics;
use crate::models::UserRecord;

#[derive(Clone)]
pub struct RegistrationService {
    admin: Arc<dyn IdpAdmin>,
    directory: Arc<dyn DirectoryClient>,
}

impl RegistrationService {
    pub fn new(admin: Arc<dyn IdpAdmin>, directory: Arc<dyn DirectoryClient>) -> Self {
        Self { admin, directory }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, RegistrationError> {
        let result = self.run(email, password).await;

        match &result {
            Ok(_) => {
                metrics::record_registration("success");
                tracing::info!("User registered");
            }
            Err(err) => metrics::record_registration(err.outcome()),
        }

        result
    }

    async fn run(&self, email: &str, password: &str) -> Result<UserRecord, RegistrationError> {
        let admin_token = self.admin.fetch_admin_token().await.map_err(|err| {
            tracing::error!(error = %err, "Could not obtain admin token");
            RegistrationError::AdminTokenFailed(err)
        })?;

        self.admin
            .create_account(admin_token, email, password)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "Identity provider refused account creation");
                RegistrationError::IdpCreateFailed(err)
            })?;

        self.directory.create_user(email, email).await.map_err(|err| {
            tracing::error!(
                email = %email,
                error = %err,
                "Directory user creation failed; identity provider account exists without a directory record"
            );
            RegistrationError::DirectoryCreateFailed(err)
        })
    }

    pub async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, ClassifiedError> {
        self.directory.get_user_by_email(email).await
    }
}

//! Upstream clients and the orchestration built on them.

pub mod admin_client;
pub mod directory_client;
pub mod error;
pub mod gateway;
pub mod http;
pub mod metrics;
pub mod registration;
pub mod token_client;

pub use admin_client::{IdpAdmin, KeycloakAdminClient};
pub use directory_client::{DirectoryClient, HttpDirectoryClient};
pub use error::{ClassifiedError, ErrorCategory, RegistrationError, RegistrationStep};
pub use gateway::IdentityGateway;
pub use http::build_http_client;
pub use registration::RegistrationService;
pub use token_client::{KeycloakTokenClient, TokenProvider};

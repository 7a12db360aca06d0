pub mod auth;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::{ErrorCategory, RegistrationStep};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Identity provider rejected the request")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// Upstream response body, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "{\"error\":\"invalid_grant\",\"error_description\":\"Invalid user credentials\"}")]
    pub details: Option<String>,
    /// Registration step that failed, for registration errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<RegistrationStep>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            category: None,
            details: None,
            step: None,
        }
    }
}

//! Directory-side user record.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User profile as stored by the directory service. The gateway always
/// registers with `username == email`.
///
/// On create, `email` and `username` echoed by the directory are advisory:
/// the gateway already knows both and fills them in when the directory omits
/// them. Only `id` is information the directory adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Directory identifier; its type is owned by the directory service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>, example = 42)]
    pub id: Option<serde_json::Value>,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "user@example.com")]
    pub username: String,
}

impl UserRecord {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            username: username.into(),
        }
    }
}

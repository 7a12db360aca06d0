//! Classification of upstream failures.
//!
//! Every outbound call (token endpoint, admin API, directory) funnels its
//! failures through [`classify_status`] or [`classify_transport`], so callers
//! only ever see one of three categories.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Upstream answered 4xx: the caller's input was refused.
    ClientRejected,
    /// Upstream answered 5xx, or a success response broke its contract.
    UpstreamUnavailable,
    /// No HTTP answer at all: timeout, refused connection, DNS failure.
    Transport,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientRejected => "client_rejected",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single upstream call, with the upstream body kept verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{category}: {upstream_body}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    /// HTTP status returned by the upstream, absent for transport failures.
    pub status: Option<u16>,
    pub upstream_body: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, status: Option<u16>, upstream_body: impl Into<String>) -> Self {
        Self {
            category,
            status,
            upstream_body: upstream_body.into(),
        }
    }

    /// A 2xx answer whose body did not match the expected shape.
    pub fn malformed(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(ErrorCategory::UpstreamUnavailable, Some(status.as_u16()), body)
    }

    pub fn is_client_rejected(&self) -> bool {
        self.category == ErrorCategory::ClientRejected
    }
}

/// Map a non-success HTTP status to its category.
///
/// 1xx and 3xx answers never carry a usable payload here (redirects are not
/// followed) and are treated as the upstream misbehaving.
pub fn classify_status(status: StatusCode, body: impl Into<String>) -> ClassifiedError {
    let category = if status.is_client_error() {
        ErrorCategory::ClientRejected
    } else {
        ErrorCategory::UpstreamUnavailable
    };

    ClassifiedError::new(category, Some(status.as_u16()), body)
}

/// Map a reqwest failure to its category.
///
/// Errors produced after a response arrived (status or decode errors) keep
/// their status; everything else is a transport failure.
pub fn classify_transport(err: &reqwest::Error) -> ClassifiedError {
    if let Some(status) = err.status() {
        return classify_status(status, err.to_string());
    }

    let reason = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };

    ClassifiedError::new(ErrorCategory::Transport, None, reason)
}

/// Which registration step stopped the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    AdminToken,
    IdpCreate,
    DirectoryCreate,
}

/// Terminal failure of a registration. Each variant names the step that
/// failed; the steps before it completed and are not undone.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("admin token request failed: {0}")]
    AdminTokenFailed(ClassifiedError),

    #[error("identity provider account creation failed: {0}")]
    IdpCreateFailed(ClassifiedError),

    /// The identity provider account exists but the directory record does
    /// not. Operators reconcile this by hand.
    #[error("directory user creation failed after identity provider account was created: {0}")]
    DirectoryCreateFailed(ClassifiedError),
}

impl RegistrationError {
    pub fn step(&self) -> RegistrationStep {
        match self {
            Self::AdminTokenFailed(_) => RegistrationStep::AdminToken,
            Self::IdpCreateFailed(_) => RegistrationStep::IdpCreate,
            Self::DirectoryCreateFailed(_) => RegistrationStep::DirectoryCreate,
        }
    }

    pub fn cause(&self) -> &ClassifiedError {
        match self {
            Self::AdminTokenFailed(err)
            | Self::IdpCreateFailed(err)
            | Self::DirectoryCreateFailed(err) => err,
        }
    }

    /// Label used for the `registrations_total` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::AdminTokenFailed(_) => "admin_token_failed",
            Self::IdpCreateFailed(_) => "idp_create_failed",
            Self::DirectoryCreateFailed(_) => "directory_create_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_hundreds_are_client_rejected() {
        for code in [400u16, 401, 404, 409, 499] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = classify_status(status, "invalid_grant");
            assert_eq!(err.category, ErrorCategory::ClientRejected, "status {}", code);
            assert_eq!(err.status, Some(code));
            assert_eq!(err.upstream_body, "invalid_grant");
        }
    }

    #[test]
    fn five_hundreds_are_upstream_unavailable() {
        for code in [500u16, 502, 503, 504, 599] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = classify_status(status, "down");
            assert_eq!(err.category, ErrorCategory::UpstreamUnavailable, "status {}", code);
        }
    }

    #[test]
    fn redirects_are_upstream_unavailable() {
        let err = classify_status(StatusCode::FOUND, "");
        assert_eq!(err.category, ErrorCategory::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn refused_connection_is_transport() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = reqwest::Client::new()
            .get(format!("http://127.0.0.1:{}/", port))
            .send()
            .await
            .unwrap_err();

        let classified = classify_transport(&err);
        assert_eq!(classified.category, ErrorCategory::Transport);
        assert_eq!(classified.status, None);
    }

    #[test]
    fn registration_error_reports_failed_step() {
        let cause = ClassifiedError::new(ErrorCategory::ClientRejected, Some(409), "User exists");
        let err = RegistrationError::IdpCreateFailed(cause.clone());
        assert_eq!(err.step(), RegistrationStep::IdpCreate);
        assert_eq!(err.cause(), &cause);
        assert_eq!(err.outcome(), "idp_create_failed");
    }

    #[test]
    fn display_includes_category_and_body() {
        let err = ClassifiedError::new(ErrorCategory::ClientRejected, Some(401), "nope");
        assert_eq!(err.to_string(), "client_rejected: nope");
    }
}

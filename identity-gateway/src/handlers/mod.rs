//! HTTP handlers for the identity gateway.

pub mod metrics;
pub mod registration;
pub mod token;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::ErrorResponse;
use crate::services::{ClassifiedError, ErrorCategory, RegistrationError};

/// HTTP status reported to the caller for a classified upstream failure.
///
/// Client rejections keep the upstream 4xx so callers can tell invalid
/// credentials (401) from malformed input (400).
pub fn status_for(err: &ClassifiedError) -> StatusCode {
    match err.category {
        ErrorCategory::ClientRejected => err
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_REQUEST),
        ErrorCategory::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorCategory::Transport => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn upstream_error_response(message: &str, err: ClassifiedError) -> Response {
    let status = status_for(&err);
    let body = ErrorResponse {
        error: message.to_string(),
        category: Some(err.category),
        details: Some(err.upstream_body),
        step: None,
    };
    (status, Json(body)).into_response()
}

pub(crate) fn registration_error_response(err: RegistrationError) -> Response {
    let step = err.step();
    let message = match &err {
        RegistrationError::AdminTokenFailed(_) => "Could not authorize account creation",
        RegistrationError::IdpCreateFailed(_) => "Identity provider refused account creation",
        RegistrationError::DirectoryCreateFailed(_) => {
            "Account created in identity provider but directory registration failed"
        }
    };

    let cause = match err {
        RegistrationError::AdminTokenFailed(cause)
        | RegistrationError::IdpCreateFailed(cause)
        | RegistrationError::DirectoryCreateFailed(cause) => cause,
    };

    let status = status_for(&cause);
    let body = ErrorResponse {
        error: message.to_string(),
        category: Some(cause.category),
        details: Some(cause.upstream_body),
        step: Some(step),
    };
    (status, Json(body)).into_response()
}

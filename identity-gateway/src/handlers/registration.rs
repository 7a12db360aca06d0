use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{registration_error_response, upstream_error_response};
use crate::{
    dtos::{auth::RegisterRequest, ErrorResponse},
    models::UserRecord,
    services::RegistrationService,
    utils::ValidatedJson,
    AppState,
};

fn registration(state: &AppState) -> Result<&RegistrationService, Response> {
    state.gateway.registration().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Registration is not enabled")),
        )
            .into_response()
    })
}

/// Register a new user in the identity provider and the user directory
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered"),
        (status = 409, description = "Email already registered in the identity provider", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Identity provider or directory error", body = ErrorResponse),
        (status = 503, description = "Identity provider or directory unreachable", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, Response> {
    registration(&state)?
        .register(&req.email, &req.password)
        .await
        .map_err(registration_error_response)?;

    Ok(StatusCode::OK)
}

/// Look up a directory user by email
#[utoipa::path(
    get,
    path = "/api/v1/users/email/{email}",
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 502, description = "Directory error", body = ErrorResponse),
        (status = 503, description = "Directory unreachable", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let user = registration(&state)?
        .find_user(&email)
        .await
        .map_err(|e| upstream_error_response("Directory lookup failed", e))?;

    match user {
        Some(user) => Ok((StatusCode::OK, Json(user))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found")),
        )
            .into_response()),
    }
}

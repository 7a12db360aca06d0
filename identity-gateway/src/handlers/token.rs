use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::upstream_error_response;
use crate::{
    dtos::{
        auth::{AuthRequest, RefreshRequest, TokenResponse},
        ErrorResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Obtain a token with username and password
#[utoipa::path(
    post,
    path = "/api/v1/token",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed request or rejected by identity provider", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Identity provider error", body = ErrorResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    ),
    tag = "Token"
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AuthRequest>,
) -> Result<impl IntoResponse, Response> {
    let token = state
        .gateway
        .obtain_token(&req.username, &req.password)
        .await
        .map_err(|e| upstream_error_response("Token request failed", e))?;

    Ok((StatusCode::OK, Json(TokenResponse::from(token))))
}

/// Exchange a refresh token for a new token set
#[utoipa::path(
    post,
    path = "/api/v1/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 400, description = "Invalid or expired refresh token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Identity provider error", body = ErrorResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    ),
    tag = "Token"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, Response> {
    let token = state
        .gateway
        .refresh_token(&req.refresh_token)
        .await
        .map_err(|e| upstream_error_response("Token refresh failed", e))?;

    Ok((StatusCode::OK, Json(TokenResponse::from(token))))
}

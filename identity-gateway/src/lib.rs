pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use service_core::observability::REQUEST_ID_HEADER;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, GatewayConfig};
use crate::services::{
    build_http_client, HttpDirectoryClient, IdentityGateway, KeycloakAdminClient,
    KeycloakTokenClient, RegistrationService,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::token::obtain_token,
        handlers::token::refresh_token,
        handlers::registration::register,
        handlers::registration::get_user_by_email,
    ),
    components(
        schemas(
            dtos::auth::AuthRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::RegisterRequest,
            dtos::auth::TokenResponse,
            dtos::ErrorResponse,
            models::UserRecord,
            services::ErrorCategory,
            services::RegistrationStep,
        )
    ),
    tags(
        (name = "Token", description = "Password and refresh-token grants"),
        (name = "Registration", description = "Account creation across identity provider and directory"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub gateway: IdentityGateway,
}

impl AppState {
    /// Wire the Keycloak clients, and the directory client when one is
    /// configured, from configuration.
    pub fn from_config(config: GatewayConfig) -> Result<Self, AppError> {
        let http = build_http_client(&config.http_client)?;

        let tokens = KeycloakTokenClient::new(http.clone(), &config.keycloak);
        let mut gateway = IdentityGateway::new(Arc::new(tokens));

        match &config.directory {
            Some(directory) => {
                let admin = KeycloakAdminClient::new(http.clone(), &config.keycloak);
                let directory = HttpDirectoryClient::new(http, directory)?;
                gateway = gateway.with_registration(RegistrationService::new(
                    Arc::new(admin),
                    Arc::new(directory),
                ));
                tracing::info!("Registration enabled");
            }
            None => tracing::info!("USER_SERVICE_URL not set; running as token proxy only"),
        }

        Ok(Self { config, gateway })
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/api/v1/token", post(handlers::token::obtain_token))
        .route("/api/v1/token/refresh", post(handlers::token::refresh_token));

    if state.gateway.registration().is_some() {
        api = api
            .route("/api/v1/register", post(handlers::registration::register))
            .route(
                "/api/v1/users/email/:email",
                get(handlers::registration::get_user_by_email),
            );
    }

    let mut app = Router::new()
        .merge(api)
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route_layer(from_fn(middleware::metrics_middleware));

    // Swagger UI only in dev; the document itself is always published.
    if state.config.environment == Environment::Dev {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = cors_layer(&state.config.security.allowed_origins);

    app.with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    // Wildcard is refused in prod by config validation.
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "registration_enabled": state.gateway.registration().is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::{body::Body, http::Request, http::StatusCode};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn router(vars: &[(&str, &str)]) -> Router {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = GatewayConfig::from_lookup(service_core::config::Config::default(), |key| {
            vars.get(key).cloned()
        })
        .unwrap();
        build_router(AppState::from_config(config).unwrap())
    }

    const BASE: &[(&str, &str)] = &[
        ("KEYCLOAK_REALM", "micros"),
        ("KEYCLOAK_CLIENT_ID", "gateway"),
        ("KEYCLOAK_CLIENT_SECRET", "s3cret"),
        ("ALLOWED_ORIGINS", "http://app.example.com"),
    ];

    #[tokio::test]
    async fn token_responses_are_never_cached() {
        let response = router(BASE)
            .oneshot(
                Request::post("/api/v1/token")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"","password":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    }

    #[tokio::test]
    async fn lookup_route_absent_without_directory() {
        let response = router(BASE)
            .oneshot(
                Request::get("/api/v1/users/email/a@b.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let response = router(BASE)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/token")
                    .header(header::ORIGIN, "http://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://app.example.com"
        );
    }
}

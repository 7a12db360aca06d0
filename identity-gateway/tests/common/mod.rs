//! Test helpers for identity-gateway integration tests.
//!
//! Spawns the gateway on an ephemeral port with Keycloak and the user
//! directory replaced by wiremock servers.

#![allow(dead_code)]

use identity_gateway::{build_router, config::GatewayConfig, services::metrics, AppState};
use serde_json::json;
use service_core::config::Config;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REALM: &str = "micros";
pub const CLIENT_ID: &str = "gateway";
pub const CLIENT_SECRET: &str = "gateway-secret";

pub const TOKEN_PATH: &str = "/realms/micros/protocol/openid-connect/token";
pub const ADMIN_USERS_PATH: &str = "/admin/realms/micros/users";
pub const DIRECTORY_PATH: &str = "/api/users";

pub struct TestApp {
    pub address: String,
    pub keycloak: MockServer,
    pub directory: Option<MockServer>,
    client: reqwest::Client,
}

impl TestApp {
    /// Gateway with registration enabled.
    pub async fn spawn() -> TestApp {
        Self::spawn_with(true, &[]).await
    }

    /// Gateway acting as a token proxy only (no `USER_SERVICE_URL`).
    pub async fn spawn_token_only() -> TestApp {
        Self::spawn_with(false, &[]).await
    }

    pub async fn spawn_with(with_directory: bool, overrides: &[(&str, &str)]) -> TestApp {
        metrics::init_metrics().expect("Failed to init metrics");

        let keycloak = MockServer::start().await;
        let directory = if with_directory {
            Some(MockServer::start().await)
        } else {
            None
        };

        let mut vars: HashMap<String, String> = HashMap::from([
            ("KEYCLOAK_AUTH_SERVER_URL".into(), keycloak.uri()),
            ("KEYCLOAK_REALM".into(), REALM.into()),
            ("KEYCLOAK_CLIENT_ID".into(), CLIENT_ID.into()),
            ("KEYCLOAK_CLIENT_SECRET".into(), CLIENT_SECRET.into()),
            ("HTTP_REQUEST_TIMEOUT_SECONDS".into(), "2".into()),
            ("HTTP_CONNECT_TIMEOUT_SECONDS".into(), "1".into()),
        ]);
        if let Some(directory) = &directory {
            vars.insert(
                "USER_SERVICE_URL".into(),
                format!("{}{}", directory.uri(), DIRECTORY_PATH),
            );
        }
        for (key, value) in overrides {
            vars.insert(key.to_string(), value.to_string());
        }

        let common = Config {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        };
        let config = GatewayConfig::from_lookup(common, |key| vars.get(key).cloned())
            .expect("Failed to build test config");

        let state = AppState::from_config(config).expect("Failed to build app state");
        let app = build_router(state);

        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("No local addr").port();

        tokio::spawn(async move {
            service_core::axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            keycloak,
            directory,
            client: reqwest::Client::new(),
        }
    }

    pub fn directory(&self) -> &MockServer {
        self.directory
            .as_ref()
            .expect("Test app spawned without a directory")
    }

    pub async fn post_json(&self, route: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, route))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, route))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Stub the client-credentials grant used before account creation.
    pub async fn mock_admin_token(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-token",
                "expires_in": 60,
                "token_type": "Bearer"
            })))
            .expect(expected_calls)
            .mount(&self.keycloak)
            .await;
    }
}

pub fn token_body() -> serde_json::Value {
    json!({
        "access_token": "eyJhbGciOiJSUzI1NiJ9.access",
        "refresh_token": "eyJhbGciOiJIUzI1NiJ9.refresh",
        "token_type": "Bearer",
        "expires_in": 300,
        "refresh_expires_in": 1800,
        "not-before-policy": 0,
        "session_state": "1f8c",
        "scope": "profile email"
    })
}

use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub keycloak: KeycloakConfig,
    /// `None` runs the gateway as a pure token proxy with registration disabled.
    pub directory: Option<DirectoryConfig>,
    pub http_client: HttpClientConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub auth_server_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Token endpoint used for the password and refresh grants.
    pub token_endpoint: String,
    /// Admin REST endpoint accepting new user representations.
    pub user_registration_endpoint: String,
}

impl KeycloakConfig {
    /// Token endpoint of the realm, used for the client-credentials grant.
    pub fn admin_token_endpoint(&self) -> String {
        realm_token_endpoint(&self.auth_server_url, &self.realm)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Users collection of the directory service, e.g. `http://localhost:8083/api/users`.
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. `from_env` wires
    /// this to the process environment; tests pass a map.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let auth_server_url = get("KEYCLOAK_AUTH_SERVER_URL", Some("http://localhost:8080"))?
            .trim_end_matches('/')
            .to_string();
        let realm = get("KEYCLOAK_REALM", None)?;

        let default_token_endpoint = realm_token_endpoint(&auth_server_url, &realm);
        let default_registration_endpoint =
            format!("{}/admin/realms/{}/users", auth_server_url, realm);

        let config = GatewayConfig {
            common,
            environment: environment.clone(),
            service_name: get("SERVICE_NAME", Some("identity-gateway"))?,
            service_version: get("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            keycloak: KeycloakConfig {
                token_endpoint: get("KEYCLOAK_TOKEN_ENDPOINT", Some(&default_token_endpoint))?,
                user_registration_endpoint: get(
                    "KEYCLOAK_USER_REGISTRATION_ENDPOINT",
                    Some(&default_registration_endpoint),
                )?,
                client_id: get("KEYCLOAK_CLIENT_ID", None)?,
                client_secret: Secret::new(get("KEYCLOAK_CLIENT_SECRET", None)?),
                auth_server_url,
                realm,
            },
            directory: lookup("USER_SERVICE_URL")
                .filter(|v| !v.is_empty())
                .map(|url| DirectoryConfig {
                    base_url: url.trim_end_matches('/').to_string(),
                }),
            http_client: HttpClientConfig {
                request_timeout: Duration::from_secs(parse_secs(
                    "HTTP_REQUEST_TIMEOUT_SECONDS",
                    &get("HTTP_REQUEST_TIMEOUT_SECONDS", Some("10"))?,
                )?),
                connect_timeout: Duration::from_secs(parse_secs(
                    "HTTP_CONNECT_TIMEOUT_SECONDS",
                    &get("HTTP_CONNECT_TIMEOUT_SECONDS", Some("5"))?,
                )?),
            },
            security: SecurityConfig {
                allowed_origins: get("ALLOWED_ORIGINS", Some("http://localhost:3000"))?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn registration_enabled(&self) -> bool {
        self.directory.is_some()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(config_error("PORT must be greater than 0"));
        }

        if self.http_client.request_timeout.is_zero() {
            return Err(config_error("HTTP_REQUEST_TIMEOUT_SECONDS must be positive"));
        }

        if self.http_client.connect_timeout.is_zero() {
            return Err(config_error("HTTP_CONNECT_TIMEOUT_SECONDS must be positive"));
        }

        if self.keycloak.client_id.trim().is_empty() {
            return Err(config_error("KEYCLOAK_CLIENT_ID must not be empty"));
        }

        if self.keycloak.client_secret.expose_secret().is_empty() {
            return Err(config_error("KEYCLOAK_CLIENT_SECRET must not be empty"));
        }

        validate_url("KEYCLOAK_AUTH_SERVER_URL", &self.keycloak.auth_server_url)?;
        validate_url("KEYCLOAK_TOKEN_ENDPOINT", &self.keycloak.token_endpoint)?;
        validate_url(
            "KEYCLOAK_USER_REGISTRATION_ENDPOINT",
            &self.keycloak.user_registration_endpoint,
        )?;
        if let Some(directory) = &self.directory {
            validate_url("USER_SERVICE_URL", &directory.base_url)?;
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(config_error("Wildcard CORS origin not allowed in production"));
        }

        Ok(())
    }
}

fn realm_token_endpoint(auth_server_url: &str, realm: &str) -> String {
    format!(
        "{}/realms/{}/protocol/openid-connect/token",
        auth_server_url.trim_end_matches('/'),
        realm
    )
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None if is_prod => Err(config_error(format!(
            "{} is required in production but not set",
            key
        ))),
        None => default
            .map(str::to_string)
            .ok_or_else(|| config_error(format!("{} is required but not set", key))),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| config_error(format!("{}: {}", key, e)))
}

fn validate_url(key: &str, value: &str) -> Result<(), AppError> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| config_error(format!("{} is not a valid URL: {}", key, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(config_error(format!(
            "{} must use http or https, got '{}'",
            key, other
        ))),
    }
}

fn config_error(msg: impl Into<String>) -> AppError {
    AppError::ConfigError(anyhow::anyhow!(msg.into()))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

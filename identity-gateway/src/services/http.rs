//! Shared plumbing for outbound calls to the identity provider and directory.

use reqwest::{redirect, Client, StatusCode};
use service_core::error::AppError;
use service_core::observability::TracedRequest;

use super::error::{classify_status, classify_transport, ClassifiedError};
use super::metrics;
use crate::config::HttpClientConfig;

/// Build the pooled client shared by every upstream client.
///
/// Redirects are not followed: an OAuth2 token endpoint answering 3xx is
/// misconfigured, not something to chase.
pub fn build_http_client(config: &HttpClientConfig) -> Result<Client, AppError> {
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(redirect::Policy::none())
        .build()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
}

/// Raw upstream answer: status plus the body read as text.
pub(crate) struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Send `request` and read the whole body. Only failures to get an answer
/// are errors here; HTTP error statuses are left to [`expect_success`].
pub(crate) async fn send(
    request: TracedRequest,
    upstream: &'static str,
) -> Result<UpstreamResponse, ClassifiedError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_failure(upstream, &e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_failure(upstream, &e))?;

    Ok(UpstreamResponse { status, body })
}

/// Pass 2xx answers through, classify everything else.
pub(crate) fn expect_success(
    upstream: &'static str,
    response: UpstreamResponse,
) -> Result<UpstreamResponse, ClassifiedError> {
    if response.status.is_success() {
        return Ok(response);
    }

    let err = classify_status(response.status, response.body);
    if err.is_client_rejected() {
        tracing::warn!(
            upstream,
            status = response.status.as_u16(),
            body = %err.upstream_body,
            "Upstream rejected request"
        );
    } else {
        tracing::error!(
            upstream,
            status = response.status.as_u16(),
            body = %err.upstream_body,
            "Upstream error"
        );
    }
    metrics::record_upstream_error(upstream, &err);
    Err(err)
}

/// Record a 2xx answer whose body could not be used.
pub(crate) fn malformed(
    upstream: &'static str,
    response: UpstreamResponse,
    reason: impl std::fmt::Display,
) -> ClassifiedError {
    tracing::error!(upstream, error = %reason, "Upstream returned an unexpected body");
    let err = ClassifiedError::malformed(response.status, response.body);
    metrics::record_upstream_error(upstream, &err);
    err
}

fn transport_failure(upstream: &'static str, e: &reqwest::Error) -> ClassifiedError {
    let err = classify_transport(e);
    tracing::error!(upstream, error = %e, category = %err.category, "Upstream request failed");
    metrics::record_upstream_error(upstream, &err);
    err
}

use axum::response::IntoResponse;

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use folio_core_health_contracts::HealthFeatureService;
use serde::Serialize;

pub fn router(service: Arc<impl HealthFeatureService>) -> Router<()> {
    Router::new()
        .route("/health", routing::get(health))
        .with_state(service)
}

#[derive(Serialize)]
struct HealthResponse {
    http: bool,
    /// `null` if no cache is configured.
    cache: Option<bool>,
}

async fn health(service: State<Arc<impl HealthFeatureService>>) -> Response {
    let status = service.get_status().await;

    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let response = HealthResponse {
        http: true,
        cache: status.cache,
    };

    (code, Json(response)).into_response()
}

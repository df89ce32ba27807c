use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing, Extension, Json, Router,
};
use folio_core_contact_contracts::{
    ContactFeatureService, ContactFormRequest, ContactSubmitError, ContactSubmitOutcome,
};
use serde_json::Value;
use tracing::error;

use super::{error, internal_server_error};
use crate::{extractors::origin::Origin, middlewares::client_ip::ClientIp, models::ApiSuccess};

pub fn router(
    service: Arc<impl ContactFeatureService>,
    cors_origin: Option<Arc<str>>,
) -> Router<()> {
    Router::new()
        .route("/contact", routing::post(submit).options(preflight))
        .with_state(ContactState {
            service,
            cors_origin,
        })
}

struct ContactState<S> {
    service: Arc<S>,
    cors_origin: Option<Arc<str>>,
}

impl<S> Clone for ContactState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cors_origin: self.cors_origin.clone(),
        }
    }
}

async fn submit<S: ContactFeatureService>(
    State(state): State<ContactState<S>>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Origin(origin): Origin,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // Unreadable or oversized bodies are validated like malformed JSON.
    let body = body
        .ok()
        .and_then(|body| serde_json::from_slice(&body).ok())
        .unwrap_or(Value::Null);

    let request = ContactFormRequest {
        origin,
        client_ip,
        body,
    };

    match state.service.submit(request).await {
        Ok(ContactSubmitOutcome::Delivered) => {
            let allow_origin = state
                .cors_origin
                .as_deref()
                .map(|origin| [(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_owned())]);
            (allow_origin, Json(ApiSuccess::delivered())).into_response()
        }
        Ok(ContactSubmitOutcome::Filtered) => Json(ApiSuccess::bot()).into_response(),
        Err(ContactSubmitError::ForbiddenOrigin) => {
            error(StatusCode::FORBIDDEN, "Forbidden origin")
        }
        Err(ContactSubmitError::RateLimited) => {
            error(StatusCode::TOO_MANY_REQUESTS, "Too many requests")
        }
        Err(ContactSubmitError::Invalid(errors)) => error(StatusCode::BAD_REQUEST, errors),
        Err(err @ ContactSubmitError::NotConfigured) => {
            error!("Failed to send contact notification: {err}");
            error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(ContactSubmitError::Delivery(message)) => {
            error!("Email provider rejected contact notification: {message}");
            error(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
        Err(ContactSubmitError::Other(err)) => internal_server_error(err),
    }
}

async fn preflight<S>(State(state): State<ContactState<S>>) -> Response {
    let allow_origin = state.cors_origin.as_deref().unwrap_or("*").to_owned();

    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST,OPTIONS".into()),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type".into()),
        ],
    )
        .into_response()
}

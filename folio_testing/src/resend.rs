use std::{future::IntoFuture, net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::info;
use url::Url;
use uuid::Uuid;

pub const EMAILS_ROUTE: &str = "/emails";

/// Emails to recipients in this domain are rejected with a validation error.
pub const REJECTED_DOMAIN: &str = "reject.example";

/// An email accepted by the testing server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// All emails the server has accepted so far, in order of arrival.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<SentEmail>>>);

impl Outbox {
    pub async fn emails(&self) -> Vec<SentEmail> {
        self.0.lock().await.clone()
    }
}

pub async fn start_server(host: IpAddr, port: u16, api_key: String) -> anyhow::Result<()> {
    info!("Starting resend testing server on {host}:{port}");
    info!("Email endpoint: http://{host}:{port}{EMAILS_ROUTE}");
    info!("API key: {api_key:?}");
    info!("Emails to any address @{REJECTED_DOMAIN} are rejected");

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(api_key, Outbox::default()))
        .await
        .context("Failed to start HTTP server")
}

/// A testing server running in the background on a random local port.
#[derive(Debug)]
pub struct ResendTestServer {
    pub endpoint: Url,
    pub outbox: Outbox,
}

impl ResendTestServer {
    pub async fn spawn(api_key: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .context("Failed to bind to a local port")?;
        let addr = listener.local_addr()?;

        let outbox = Outbox::default();
        tokio::spawn(axum::serve(listener, router(api_key.into(), outbox.clone())).into_future());

        Ok(Self {
            endpoint: format!("http://{addr}{EMAILS_ROUTE}").parse()?,
            outbox,
        })
    }
}

pub fn router(api_key: String, outbox: Outbox) -> Router {
    Router::new()
        .route(EMAILS_ROUTE, routing::post(send_email))
        .with_state(Arc::new(StateInner { api_key, outbox }))
}

struct StateInner {
    api_key: String,
    outbox: Outbox,
}

async fn send_email(
    State(state): State<Arc<StateInner>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    email: Result<Json<SentEmail>, JsonRejection>,
) -> Response {
    let Some(TypedHeader(auth)) = auth else {
        return error(
            StatusCode::UNAUTHORIZED,
            "missing_api_key",
            "Missing API key in the authorization header".into(),
        );
    };
    if auth.token() != state.api_key {
        return error(
            StatusCode::FORBIDDEN,
            "invalid_api_key",
            "API key is invalid".into(),
        );
    }

    let Json(email) = match email {
        Ok(email) => email,
        Err(err) => {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                err.body_text(),
            )
        }
    };

    if email.to.is_empty() {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Missing `to` field.".into(),
        );
    }
    if let Some(rejected) = email
        .to
        .iter()
        .find(|to| to.rsplit_once('@').is_some_and(|(_, domain)| domain == REJECTED_DOMAIN))
    {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            format!("The recipient {rejected} has been rejected."),
        );
    }

    info!(to = ?email.to, subject = %email.subject, "email received");
    state.outbox.0.lock().await.push(email);

    Json(SendEmailResponse {
        id: Uuid::now_v7().to_string(),
    })
    .into_response()
}

#[derive(Serialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    status_code: u16,
    message: String,
    name: &'static str,
}

fn error(status: StatusCode, name: &'static str, message: String) -> Response {
    let body = ErrorResponse {
        status_code: status.as_u16(),
        message,
        name,
    };
    (status, Json(body)).into_response()
}

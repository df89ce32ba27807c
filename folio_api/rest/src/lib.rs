use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::Router;
use folio_core_contact_contracts::ContactFeatureService;
use folio_core_health_contracts::HealthFeatureService;
use tokio::net::TcpListener;
use tracing::info;

mod extractors;
mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub addr: IpAddr,
    pub port: u16,
    pub real_ip_config: Option<Arc<RestServerRealIpConfig>>,
    /// Advertised in `Access-Control-Allow-Origin`, `None` admits any origin.
    pub cors_origin: Option<Arc<str>>,
}

#[derive(Debug)]
pub struct RestServerRealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
{
    pub fn new(health: Health, contact: Contact, config: RestServerConfig) -> Self {
        Self {
            health,
            contact,
            config,
        }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let RestServerConfig { addr, port, .. } = self.config;

        let listener = TcpListener::bind((addr, port))
            .await
            .with_context(|| format!("Failed to bind to {addr}:{port}"))?;
        info!("Listening on {addr}:{port}");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("Failed to start HTTP server")
    }

    pub fn router(self) -> Router<()> {
        let router = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(
                self.contact.into(),
                self.config.cors_origin.clone(),
            ));

        let router = middlewares::panic_handler::add(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::client_ip::add(self.config.real_ip_config.clone())(router);
        middlewares::request_id::add(router)
    }
}

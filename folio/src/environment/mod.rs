use std::sync::Arc;

use anyhow::Context;
use folio_api_rest::{RestServerConfig, RestServerRealIpConfig};
use folio_cache_contracts::CacheService;
use folio_config::Config;
use folio_core_contact_impl::{
    rate_limit::{ContactRateLimitConfig, ContactRateLimitServiceImpl},
    AllowedOrigins, ContactFeatureConfig, ContactFeatureServiceImpl,
};
use folio_core_health_impl::{HealthFeatureConfig, HealthFeatureServiceImpl};
use folio_email_contracts::EmailService;
use folio_utils::Apply;
use types::{RestServer, Template};

pub mod types;

/// Wires the external resources and the configuration into the service tree.
#[derive(Debug)]
pub struct Provider<Cache, Email> {
    config: ConfigProvider,
    /// Rate limiting and the cache health check are disabled without a cache.
    cache: Option<Cache>,
    email: Email,
}

impl<Cache, Email> Provider<Cache, Email>
where
    Cache: CacheService + Clone,
    Email: EmailService,
{
    pub fn new(config: ConfigProvider, cache: Option<Cache>, email: Email) -> Self {
        Self {
            config,
            cache,
            email,
        }
    }

    pub fn rest_server(self) -> anyhow::Result<RestServer<Cache, Email>> {
        let Self {
            config,
            cache,
            email,
        } = self;

        let template = Template::new().context("Failed to load email templates")?;

        let health = HealthFeatureServiceImpl::new(cache.clone(), config.health_feature_config);
        let rate_limit =
            ContactRateLimitServiceImpl::new(cache, config.contact_rate_limit_config);
        let contact = ContactFeatureServiceImpl::new(
            rate_limit,
            email,
            template,
            config.contact_feature_config,
        );

        Ok(RestServer::new(health, contact, config.rest_server_config))
    }
}

/// Service configs derived from the [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    // API
    pub rest_server_config: RestServerConfig,

    // Core
    pub contact_feature_config: ContactFeatureConfig,
    pub contact_rate_limit_config: ContactRateLimitConfig,
    pub health_feature_config: HealthFeatureConfig,
}

impl ConfigProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let allowed_origins = Arc::new(AllowedOrigins::new(&config.contact.allowed_origins));

        // API
        let rest_server_config = RestServerConfig {
            addr: config.http.host,
            port: config.http.port,
            real_ip_config: None,
            cors_origin: allowed_origins.first().map(Into::into),
        }
        .apply_map(config.http.real_ip.as_ref(), |slf, real_ip_config| {
            RestServerConfig {
                real_ip_config: Some(Arc::new(RestServerRealIpConfig {
                    header: real_ip_config.header.clone(),
                    set_from: real_ip_config.set_from,
                })),
                ..slf
            }
        });

        // Core
        anyhow::ensure!(
            config.contact.rate_limit.max_requests > 0,
            "contact.rate_limit.max_requests must be positive"
        );
        anyhow::ensure!(
            !config.contact.rate_limit.window.is_zero(),
            "contact.rate_limit.window must not be empty"
        );

        let contact_feature_config = ContactFeatureConfig {
            allowed_origins,
            recipient: config.contact.recipient.clone().into(),
            subject_prefix: config.contact.subject_prefix.as_str().into(),
        };

        let contact_rate_limit_config = ContactRateLimitConfig {
            max_requests: config.contact.rate_limit.max_requests,
            window: config.contact.rate_limit.window.into(),
        };

        let health_feature_config = HealthFeatureConfig {
            cache_ttl: config.health.cache_ttl.into(),
        };

        Ok(Self {
            // API
            rest_server_config,

            // Core
            contact_feature_config,
            contact_rate_limit_config,
            health_feature_config,
        })
    }
}

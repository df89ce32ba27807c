use folio_core_contact_impl::{rate_limit::ContactRateLimitServiceImpl, ContactFeatureServiceImpl};
use folio_core_health_impl::HealthFeatureServiceImpl;
use folio_templates_impl::TemplateServiceImpl;

// API
pub type RestServer<Cache, Email> =
    folio_api_rest::RestServer<HealthFeature<Cache>, ContactFeature<Cache, Email>>;

// Templates
pub type Template = TemplateServiceImpl;

// Core
pub type ContactRateLimit<Cache> = ContactRateLimitServiceImpl<Cache>;
pub type ContactFeature<Cache, Email> =
    ContactFeatureServiceImpl<ContactRateLimit<Cache>, Email, Template>;

pub type HealthFeature<Cache> = HealthFeatureServiceImpl<Cache>;

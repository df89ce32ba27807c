use std::{net::IpAddr, path::Path};

use anyhow::Context;
use config::{Environment, File, FileFormat};
use folio_models::{email_address::EmailAddress, Sensitive};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

/// The default configuration, compiled into the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../../config.toml");

/// Colon separated list of additional config files.
pub const CONFIG_PATHS_ENV: &str = "FOLIO_CONFIG";

/// Prefix of environment variables overriding individual keys.
pub const ENV_PREFIX: &str = "FOLIO";

/// Load the configuration from the default config, the files listed in
/// `FOLIO_CONFIG` and `FOLIO__*` environment variables.
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var(CONFIG_PATHS_ENV).unwrap_or_default();
    let paths = paths
        .split(':')
        .filter(|path| !path.is_empty())
        .map(Path::new)
        .collect::<Vec<_>>();
    load_with_overrides(&paths, &[])
}

/// Like [`load`], but with an explicit list of config files and additional
/// inline TOML snippets that take precedence over everything else.
pub fn load_with_overrides(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    let builder = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    let builder = paths.iter().try_fold(builder, |builder, path| {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        anyhow::Ok(builder.add_source(File::from_str(&content, FileFormat::Toml)))
    })?;

    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("contact.allowed_origins")
            .try_parsing(true),
    );

    overrides
        .iter()
        .fold(builder, |builder, snippet| {
            builder.add_source(File::from_str(snippet, FileFormat::Toml))
        })
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub cache: Option<CacheConfig>,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub real_ip: Option<HttpRealIpConfig>,
}

/// Trust the client address in `header` if the request comes from `set_from`.
#[derive(Debug, Deserialize)]
pub struct HttpRealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub endpoint: Url,
    pub api_key: Option<Sensitive<String>>,
    pub from: EmailAddress,
    pub from_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub recipient: EmailAddress,
    pub subject_prefix: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub rate_limit: ContactRateLimitConfig,
}

#[derive(Debug, Deserialize)]
pub struct ContactRateLimitConfig {
    pub max_requests: u64,
    pub window: Duration,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> Duration {
    Duration(std::time::Duration::from_secs(5))
}

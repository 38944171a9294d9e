use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::providers::ProviderKind;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub providers: ProviderSettings,
    pub processing: ProcessingConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let config = Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            providers: ProviderSettings::from_env()?,
            processing: ProcessingConfig::from_env()?,
            store: StoreConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would make every invocation fail outright.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.chain.is_empty() {
            return Err(ConfigError::EmptyProviderChain);
        }

        let configured = self.providers.configured();
        if configured.is_empty() {
            return Err(ConfigError::NoConfiguredProviders);
        }
        for provider in &self.providers.chain {
            if !configured.contains(provider) {
                tracing::warn!(
                    %provider,
                    "provider in fallback chain has no credentials and will be skipped"
                );
            }
        }

        self.processing.validate()?;
        Ok(())
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Provider chain order plus the opaque credentials handed to each adapter.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub chain: Vec<ProviderKind>,
    pub rapidapi: Option<RapidApiCredentials>,
    pub scrapfly: Option<ScrapflyCredentials>,
    pub proxycurl: Option<ProxycurlCredentials>,
}

#[derive(Debug, Clone)]
pub struct RapidApiCredentials {
    pub api_key: String,
    pub api_host: String,
}

#[derive(Debug, Clone)]
pub struct ScrapflyCredentials {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ProxycurlCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl ProviderSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let chain_raw = env::var("PROVIDER_FALLBACK_CHAIN")
            .unwrap_or_else(|_| "rapidapi,scrapfly,proxycurl".to_string());
        let mut chain = Vec::new();
        for name in chain_raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let provider = ProviderKind::parse(name)
                .ok_or_else(|| ConfigError::UnknownProvider(name.to_string()))?;
            chain.push(provider);
        }

        let rapidapi = match (non_empty_var("RAPIDAPI_KEY"), non_empty_var("RAPIDAPI_HOST")) {
            (Some(api_key), Some(api_host)) => Some(RapidApiCredentials { api_key, api_host }),
            _ => None,
        };

        let scrapfly = non_empty_var("SCRAPFLY_API_KEY").map(|api_key| ScrapflyCredentials {
            api_key,
            base_url: env::var("SCRAPFLY_BASE_URL")
                .unwrap_or_else(|_| "https://api.scrapfly.io/scrape".to_string()),
        });

        let proxycurl = non_empty_var("PROXYCURL_API_KEY").map(|api_key| ProxycurlCredentials {
            api_key,
            base_url: env::var("PROXYCURL_BASE_URL")
                .unwrap_or_else(|_| "https://nubela.co/proxycurl/api/v2/linkedin".to_string()),
        });

        Ok(Self {
            chain,
            rapidapi,
            scrapfly,
            proxycurl,
        })
    }

    /// Providers whose credentials are present, regardless of chain order.
    pub fn configured(&self) -> Vec<ProviderKind> {
        let mut configured = Vec::new();
        if self.rapidapi.is_some() {
            configured.push(ProviderKind::RapidApi);
        }
        if self.scrapfly.is_some() {
            configured.push(ProviderKind::Scrapfly);
        }
        if self.proxycurl.is_some() {
            configured.push(ProviderKind::Proxycurl);
        }
        configured
    }
}

/// Retry, timeout, scoring, and batching knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub request_timeout: Duration,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub max_attempts: u32,
    pub quality_threshold: u8,
    pub max_workers: usize,
    pub processing_budget: Duration,
}

impl ProcessingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT", 30)?),
            retry_delay: Duration::from_secs(parse_var("RETRY_DELAY", 5)?),
            max_retry_delay: Duration::from_secs(parse_var("MAX_RETRY_DELAY", 60)?),
            max_attempts: parse_var("MAX_RETRIES", 2)?,
            quality_threshold: parse_var("QUALITY_SCORE_THRESHOLD", 75)?,
            max_workers: parse_var("MAX_WORKERS", 4)?,
            processing_budget: Duration::from_secs(parse_var("PROCESSING_TIMEOUT", 300)?),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::NonPositive("REQUEST_TIMEOUT"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NonPositive("MAX_RETRIES"));
        }
        if self.quality_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.quality_threshold));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::NonPositive("MAX_WORKERS"));
        }
        if self.processing_budget.is_zero() {
            return Err(ConfigError::NonPositive("PROCESSING_TIMEOUT"));
        }
        Ok(())
    }
}

/// Connection settings for the persistence REST service.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            non_empty_var("STORE_BASE_URL").ok_or(ConfigError::Missing("STORE_BASE_URL"))?;
        let api_key =
            non_empty_var("STORE_API_KEY").ok_or(ConfigError::Missing("STORE_API_KEY"))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(parse_var("STORE_TIMEOUT_SECONDS", 30)?),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    Missing(&'static str),
    InvalidNumber { key: &'static str, value: String },
    UnknownProvider(String),
    EmptyProviderChain,
    NoConfiguredProviders,
    NonPositive(&'static str),
    ThresholdOutOfRange(u8),
    HttpClient(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::Missing(key) => {
                write!(f, "required environment variable {key} is not set")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric, got '{value}'")
            }
            ConfigError::UnknownProvider(name) => {
                write!(f, "unknown provider '{name}' in PROVIDER_FALLBACK_CHAIN")
            }
            ConfigError::EmptyProviderChain => {
                write!(f, "PROVIDER_FALLBACK_CHAIN must name at least one provider")
            }
            ConfigError::NoConfiguredProviders => {
                write!(
                    f,
                    "no provider credentials configured; set at least one provider key"
                )
            }
            ConfigError::NonPositive(key) => write!(f, "{key} must be greater than 0"),
            ConfigError::ThresholdOutOfRange(value) => {
                write!(
                    f,
                    "QUALITY_SCORE_THRESHOLD must be between 0 and 100, got {value}"
                )
            }
            ConfigError::HttpClient(message) => {
                write!(f, "failed to build outbound HTTP client: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PROVIDER_FALLBACK_CHAIN",
            "RAPIDAPI_KEY",
            "RAPIDAPI_HOST",
            "SCRAPFLY_API_KEY",
            "SCRAPFLY_BASE_URL",
            "PROXYCURL_API_KEY",
            "PROXYCURL_BASE_URL",
            "REQUEST_TIMEOUT",
            "RETRY_DELAY",
            "MAX_RETRY_DELAY",
            "MAX_RETRIES",
            "QUALITY_SCORE_THRESHOLD",
            "MAX_WORKERS",
            "PROCESSING_TIMEOUT",
            "STORE_BASE_URL",
            "STORE_API_KEY",
            "STORE_TIMEOUT_SECONDS",
        ] {
            env::remove_var(key);
        }
    }

    fn set_minimum_env() {
        env::set_var("STORE_BASE_URL", "https://internal.example.test/");
        env::set_var("STORE_API_KEY", "secret");
        env::set_var("RAPIDAPI_KEY", "key");
        env::set_var("RAPIDAPI_HOST", "profiles.example.test");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_minimum_env();

        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.providers.chain,
            vec![
                ProviderKind::RapidApi,
                ProviderKind::Scrapfly,
                ProviderKind::Proxycurl
            ]
        );
        assert_eq!(config.processing.quality_threshold, 75);
        assert_eq!(config.processing.max_workers, 4);
        assert_eq!(config.store.base_url, "https://internal.example.test");
    }

    #[test]
    fn load_rejects_missing_store_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RAPIDAPI_KEY", "key");
        env::set_var("RAPIDAPI_HOST", "profiles.example.test");

        let error = AppConfig::load().expect_err("store url is required");
        assert!(matches!(error, ConfigError::Missing("STORE_BASE_URL")));
    }

    #[test]
    fn load_rejects_unknown_chain_provider() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_minimum_env();
        env::set_var("PROVIDER_FALLBACK_CHAIN", "rapidapi,espionage");

        let error = AppConfig::load().expect_err("unknown provider rejected");
        assert!(matches!(error, ConfigError::UnknownProvider(name) if name == "espionage"));
    }

    #[test]
    fn load_rejects_chain_without_any_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("STORE_BASE_URL", "https://internal.example.test");
        env::set_var("STORE_API_KEY", "secret");

        let error = AppConfig::load().expect_err("no providers configured");
        assert!(matches!(error, ConfigError::NoConfiguredProviders));
    }

    #[test]
    fn load_rejects_out_of_range_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_minimum_env();
        env::set_var("QUALITY_SCORE_THRESHOLD", "140");

        let error = AppConfig::load().expect_err("threshold above 100 rejected");
        assert!(matches!(error, ConfigError::ThresholdOutOfRange(140)));
    }
}

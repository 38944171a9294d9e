//! Provider adapters for the fallback chain.
//!
//! The provider set is a fixed closed set known at deploy time, so dispatch is
//! an enum rather than trait objects. Every adapter shares one process-wide
//! `reqwest::Client` and maps upstream responses into the fetch taxonomy.

pub mod proxycurl;
pub mod rapidapi;
pub mod scrapfly;

pub use proxycurl::ProxycurlClient;
pub use rapidapi::RapidApiClient;
pub use scrapfly::ScrapflyClient;

use std::fmt;
use std::future::Future;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{AppConfig, ConfigError};
use crate::error::{ClassifiedError, ErrorKind};

const USER_AGENT: &str = concat!("profile-relay/", env!("CARGO_PKG_VERSION"));

/// The closed set of data providers the chain can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    RapidApi,
    Scrapfly,
    Proxycurl,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rapidapi" => Some(Self::RapidApi),
            "scrapfly" => Some(Self::Scrapfly),
            "proxycurl" => Some(Self::Proxycurl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RapidApi => "rapidapi",
            Self::Scrapfly => "scrapfly",
            Self::Proxycurl => "proxycurl",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload returned by a provider, tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProfile {
    pub provider: ProviderKind,
    pub body: Value,
}

/// One capability per provider: fetch a raw profile payload by username.
///
/// The `Send` bound on the returned future lets generic callers run fetches
/// from spawned batch workers.
pub trait FetchProfile: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn fetch(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Value, ClassifiedError>> + Send;
}

/// Enum dispatch over the configured adapters.
pub enum ProviderAdapter {
    RapidApi(RapidApiClient),
    Scrapfly(ScrapflyClient),
    Proxycurl(ProxycurlClient),
}

impl FetchProfile for ProviderAdapter {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::RapidApi(_) => ProviderKind::RapidApi,
            Self::Scrapfly(_) => ProviderKind::Scrapfly,
            Self::Proxycurl(_) => ProviderKind::Proxycurl,
        }
    }

    async fn fetch(&self, username: &str) -> Result<Value, ClassifiedError> {
        match self {
            Self::RapidApi(client) => client.fetch_profile(username).await,
            Self::Scrapfly(client) => client.fetch_profile(username).await,
            Self::Proxycurl(client) => client.fetch_profile(username).await,
        }
    }
}

/// Builds the adapter chain in configured order, skipping providers without
/// credentials. The chain order is resolved once here and never reordered.
pub fn provider_chain(config: &AppConfig) -> Result<Vec<ProviderAdapter>, ConfigError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

    let mut chain = Vec::new();
    for provider in &config.providers.chain {
        match provider {
            ProviderKind::RapidApi => match &config.providers.rapidapi {
                Some(credentials) => chain.push(ProviderAdapter::RapidApi(RapidApiClient::new(
                    client.clone(),
                    credentials,
                ))),
                None => tracing::info!("rapidapi credentials not configured, skipping adapter"),
            },
            ProviderKind::Scrapfly => match &config.providers.scrapfly {
                Some(credentials) => chain.push(ProviderAdapter::Scrapfly(ScrapflyClient::new(
                    client.clone(),
                    credentials,
                ))),
                None => tracing::info!("scrapfly credentials not configured, skipping adapter"),
            },
            ProviderKind::Proxycurl => match &config.providers.proxycurl {
                Some(credentials) => chain.push(ProviderAdapter::Proxycurl(ProxycurlClient::new(
                    client.clone(),
                    credentials,
                ))),
                None => tracing::info!("proxycurl credentials not configured, skipping adapter"),
            },
        }
    }

    if chain.is_empty() {
        return Err(ConfigError::NoConfiguredProviders);
    }
    Ok(chain)
}

pub(crate) fn classify_transport(provider: ProviderKind, err: reqwest::Error) -> ClassifiedError {
    let kind = if err.is_timeout() {
        ErrorKind::FetchTimeout
    } else {
        ErrorKind::FetchConnection
    };
    ClassifiedError::for_provider(kind, provider, err.to_string())
}

pub(crate) fn classify_status(provider: ProviderKind, status: StatusCode) -> ClassifiedError {
    let (kind, message) = match status.as_u16() {
        401 | 403 => (
            ErrorKind::FetchAuthentication,
            format!("authentication rejected with status {status}"),
        ),
        404 => (ErrorKind::FetchNotFound, "profile not found".to_string()),
        429 => (
            ErrorKind::FetchRateLimit,
            "rate limit exceeded".to_string(),
        ),
        500..=599 => (
            ErrorKind::FetchConnection,
            format!("upstream server error {status}"),
        ),
        _ => (
            ErrorKind::TransformInvalidPayload,
            format!("provider rejected the request with status {status}"),
        ),
    };
    ClassifiedError::for_provider(kind, provider, message)
}

/// A usable payload is a non-empty body that parses as JSON.
pub(crate) fn parse_body(provider: ProviderKind, body: &str) -> Result<Value, ClassifiedError> {
    if body.trim().is_empty() {
        return Err(ClassifiedError::for_provider(
            ErrorKind::TransformInvalidPayload,
            provider,
            "empty response body",
        ));
    }
    serde_json::from_str(body).map_err(|err| {
        ClassifiedError::for_provider(
            ErrorKind::TransformInvalidPayload,
            provider,
            format!("response body is not valid JSON: {err}"),
        )
    })
}

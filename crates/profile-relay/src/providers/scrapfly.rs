use serde_json::Value;
use tracing::debug;

use super::{classify_status, classify_transport, parse_body, ProviderKind};
use crate::config::ScrapflyCredentials;
use crate::error::{ClassifiedError, ErrorKind};

const KIND: ProviderKind = ProviderKind::Scrapfly;

/// Adapter for the Scrapfly scraping proxy. The proxy wraps the extracted
/// profile in a `result` envelope; the adapter unwraps it so the transformer
/// only ever sees the profile document.
pub struct ScrapflyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ScrapflyClient {
    pub fn new(http: reqwest::Client, credentials: &ScrapflyCredentials) -> Self {
        Self {
            http,
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
        }
    }

    pub(crate) async fn fetch_profile(&self, username: &str) -> Result<Value, ClassifiedError> {
        let target = format!("https://www.linkedin.com/in/{username}");
        debug!(%username, "querying scrapfly extraction endpoint");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("url", target.as_str())])
            .send()
            .await
            .map_err(|err| classify_transport(KIND, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(KIND, status));
        }

        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(KIND, err))?;
        let envelope = parse_body(KIND, &body)?;

        let result = envelope
            .get("result")
            .filter(|value| value.is_object())
            .cloned()
            .ok_or_else(|| {
                ClassifiedError::for_provider(
                    ErrorKind::TransformInvalidPayload,
                    KIND,
                    "response envelope has no result object",
                )
            })?;

        if result.get("full_name").is_none() && result.get("headline").is_none() {
            return Err(ClassifiedError::for_provider(
                ErrorKind::TransformInvalidPayload,
                KIND,
                "extracted document carries no identifying fields",
            ));
        }

        Ok(result)
    }
}

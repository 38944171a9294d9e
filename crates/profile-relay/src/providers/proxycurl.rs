use serde_json::Value;
use tracing::debug;

use super::{classify_status, classify_transport, parse_body, ProviderKind};
use crate::config::ProxycurlCredentials;
use crate::error::{ClassifiedError, ErrorKind};

const KIND: ProviderKind = ProviderKind::Proxycurl;

/// Adapter for the Proxycurl person-profile endpoint.
pub struct ProxycurlClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ProxycurlClient {
    pub fn new(http: reqwest::Client, credentials: &ProxycurlCredentials) -> Self {
        Self {
            http,
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
        }
    }

    pub(crate) async fn fetch_profile(&self, username: &str) -> Result<Value, ClassifiedError> {
        let target = format!("https://www.linkedin.com/in/{username}");
        debug!(%username, "querying proxycurl person endpoint");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("url", target.as_str())])
            .bearer_auth(&self.api_key)
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
        let value = parse_body(KIND, &body)?;

        if value.get("public_identifier").is_none() && value.get("headline").is_none() {
            return Err(ClassifiedError::for_provider(
                ErrorKind::TransformInvalidPayload,
                KIND,
                "response carries no identifying fields",
            ));
        }

        Ok(value)
    }
}

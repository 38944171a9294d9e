use serde_json::Value;
use tracing::debug;

use super::{classify_status, classify_transport, parse_body, ProviderKind};
use crate::config::RapidApiCredentials;
use crate::error::{ClassifiedError, ErrorKind};

const KIND: ProviderKind = ProviderKind::RapidApi;

/// Adapter for the RapidAPI-hosted profile endpoint.
pub struct RapidApiClient {
    http: reqwest::Client,
    api_key: String,
    api_host: String,
}

impl RapidApiClient {
    pub fn new(http: reqwest::Client, credentials: &RapidApiCredentials) -> Self {
        Self {
            http,
            api_key: credentials.api_key.clone(),
            api_host: credentials.api_host.clone(),
        }
    }

    pub(crate) async fn fetch_profile(&self, username: &str) -> Result<Value, ClassifiedError> {
        let url = format!("https://{}/", self.api_host);
        debug!(%username, "querying rapidapi profile endpoint");

        let response = self
            .http
            .get(&url)
            .query(&[("username", username)])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
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

        // The upstream reports inaccessible profiles inside a 200 body.
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("profile cannot be accessed");
            return Err(ClassifiedError::for_provider(
                ErrorKind::FetchNotFound,
                KIND,
                message.to_string(),
            ));
        }

        if field_is_blank(&value, "username") && field_is_blank(&value, "headline") {
            return Err(ClassifiedError::for_provider(
                ErrorKind::TransformInvalidPayload,
                KIND,
                "response carries no identifying fields",
            ));
        }

        Ok(value)
    }
}

fn field_is_blank(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .and_then(Value::as_str)
        .map_or(true, |text| text.trim().is_empty())
}

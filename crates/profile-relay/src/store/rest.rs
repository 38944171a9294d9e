use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ProfileStore, StoreError, StoredProfile};
use crate::config::{ConfigError, StoreConfig};
use crate::pipeline::profile::CanonicalProfile;
use crate::pipeline::scoring::QualityScore;

/// REST-backed persistence client. Built once per process; the inner
/// `reqwest::Client` pools connections across identifiers and invocations.
pub struct RestProfileStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct NodeEnvelope {
    #[serde(default)]
    data: Option<NodeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeDocument {
    #[serde(default)]
    node_id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    scraped: bool,
}

impl From<NodeDocument> for StoredProfile {
    fn from(document: NodeDocument) -> Self {
        Self {
            node_id: document.node_id,
            username: document.username,
            already_scraped: document.scraped,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AckEnvelope {
    #[serde(default = "default_true")]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct NodesEnvelope {
    #[serde(default)]
    nodes: Vec<NodeDocument>,
}

fn default_true() -> bool {
    true
}

impl RestProfileStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api/{}", self.base_url, route.trim_start_matches('/'))
    }

    fn classify_transport(err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else {
            StoreError::Connection(err.to_string())
        }
    }

    fn reject(operation: &str, status: StatusCode) -> StoreError {
        if status == StatusCode::CONFLICT {
            StoreError::Duplicate
        } else {
            StoreError::Connection(format!("{operation} failed with status {status}"))
        }
    }
}

impl ProfileStore for RestProfileStore {
    async fn lookup(&self, node_id: &str) -> Result<Option<StoredProfile>, StoreError> {
        let url = self.url(&format!("nodes/{node_id}"));
        debug!(%node_id, "store lookup");

        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject("lookup", status));
        }

        let envelope: NodeEnvelope = response
            .json()
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        Ok(envelope.data.map(StoredProfile::from))
    }

    async fn persist(
        &self,
        node_id: &str,
        profile: &CanonicalProfile,
        score: &QualityScore,
    ) -> Result<(), StoreError> {
        let url = self.url(&format!("nodes/{node_id}"));
        let payload = json!({
            "nodeId": node_id,
            "data": {
                "profile": profile,
                "qualityScore": score.overall,
                "qualityGrade": score.grade.label(),
                "scraped": true,
                "lastAttemptedAt": Utc::now(),
            },
        });

        let response = self
            .http
            .patch(&url)
            .header("X-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject("persist", status));
        }

        let ack: AckEnvelope = response
            .json()
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        if !ack.success {
            return Err(StoreError::Connection(
                "store rejected the profile update".to_string(),
            ));
        }
        Ok(())
    }

    async fn mark_failed(&self, node_id: &str, reason: &str) -> Result<(), StoreError> {
        let url = self.url("nodes/mark-error");
        let payload = json!({ "nodeId": node_id, "errorMessage": reason });

        let response = self
            .http
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject("mark-error", status));
        }
        Ok(())
    }

    async fn candidates(&self, limit: usize) -> Result<Vec<StoredProfile>, StoreError> {
        let url = self.url("nodes/scrape-candidates");

        let response = self
            .http
            .get(&url)
            .query(&[("limit", limit)])
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::reject("candidates", status));
        }

        let envelope: NodesEnvelope = response
            .json()
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        Ok(envelope.nodes.into_iter().map(StoredProfile::from).collect())
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use profile_relay::pipeline::{BatchResult, Identifier};
use profile_relay::providers::FetchProfile;
use profile_relay::store::ProfileStore;

use crate::error::AppError;
use crate::infra::{AppState, Pipeline};

/// Candidate count used when a batch invocation does not name a limit.
const DEFAULT_BATCH_LIMIT: usize = 5;

/// Every invocation shape the adapter accepts: single identifier, explicit
/// list, detailed entries, or batch mode resolved against the store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProcessRequest {
    #[serde(default)]
    node_id: Option<String>,
    #[serde(default)]
    node_ids: Option<Vec<String>>,
    #[serde(default)]
    nodes: Option<Vec<NodeEntry>>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    batch: bool,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeEntry {
    node_id: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug)]
struct Job {
    identifier: Identifier,
    user_id: Option<String>,
}

enum Invocation {
    Explicit(Vec<Job>),
    Batch { limit: usize },
    Empty,
}

impl ProcessRequest {
    fn into_invocation(self) -> Invocation {
        if let Some(nodes) = self.nodes {
            let jobs = nodes
                .into_iter()
                .map(|entry| Job {
                    identifier: identifier_from(entry.node_id, entry.username),
                    user_id: entry.user_id,
                })
                .collect();
            return Invocation::Explicit(jobs);
        }

        if let Some(node_ids) = self.node_ids {
            let user_id = self.user_id;
            let jobs = node_ids
                .into_iter()
                .map(|node_id| Job {
                    identifier: Identifier::new(node_id),
                    user_id: user_id.clone(),
                })
                .collect();
            return Invocation::Explicit(jobs);
        }

        if let Some(node_id) = self.node_id {
            return Invocation::Explicit(vec![Job {
                identifier: identifier_from(node_id, self.username),
                user_id: self.user_id,
            }]);
        }

        if self.batch {
            return Invocation::Batch {
                limit: self.limit.unwrap_or(DEFAULT_BATCH_LIMIT),
            };
        }

        Invocation::Empty
    }
}

fn identifier_from(node_id: String, username: Option<String>) -> Identifier {
    match username {
        Some(username) => Identifier::with_username(node_id, username),
        None => Identifier::new(node_id),
    }
}

pub(crate) fn with_pipeline_routes<S, F>(pipeline: Arc<Pipeline<S, F>>) -> Router
where
    S: ProfileStore + 'static,
    F: FetchProfile + 'static,
{
    Router::new()
        .route("/api/v1/nodes/process", post(process_endpoint::<S, F>))
        .with_state(pipeline)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn process_endpoint<S, F>(
    State(pipeline): State<Arc<Pipeline<S, F>>>,
    Json(payload): Json<ProcessRequest>,
) -> Result<Json<Value>, AppError>
where
    S: ProfileStore + 'static,
    F: FetchProfile + 'static,
{
    let jobs = match payload.into_invocation() {
        Invocation::Explicit(jobs) => jobs,
        Invocation::Batch { limit } => {
            let candidates = pipeline.store.candidates(limit).await?;
            candidates
                .into_iter()
                .map(|record| Job {
                    identifier: record.identifier(),
                    user_id: None,
                })
                .collect()
        }
        Invocation::Empty => {
            return Ok(Json(json!({
                "statusCode": 200,
                "body": {
                    "processed": 0,
                    "succeeded": 0,
                    "failed": 0,
                    "message": "No identifiers to process",
                },
            })));
        }
    };

    let (identifiers, user_ids): (Vec<Identifier>, Vec<Option<String>>) = jobs
        .into_iter()
        .map(|job| (job.identifier, job.user_id))
        .unzip();

    let result = pipeline.run(identifiers).await;
    Ok(Json(render_response(&result, &user_ids)))
}

/// Maps the batch result onto the response contract, flattening the lone
/// result for single-identifier invocations.
fn render_response(result: &BatchResult, user_ids: &[Option<String>]) -> Value {
    let results: Vec<Value> = result
        .outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            let mut entry = json!({
                "nodeId": outcome.identifier.node_id,
                "success": outcome.success,
                "alreadyProcessed": outcome.already_processed,
                "newlyScraped": outcome.newly_scraped,
            });
            if let Some(Some(user_id)) = user_ids.get(index) {
                entry["userId"] = json!(user_id);
            }
            if let Some(quality) = &outcome.quality {
                entry["qualityScore"] = json!(quality.overall);
                entry["qualityGrade"] = json!(quality.grade.label());
            }
            if let Some(error) = &outcome.error {
                entry["error"] = json!(error.to_string());
            }
            entry
        })
        .collect();

    let mut body = json!({
        "processed": result.processed,
        "succeeded": result.succeeded,
        "failed": result.failed,
        "profiles_scraped": result.profiles_scraped,
        "success": result.all_succeeded(),
        "results": results,
    });
    if !result.retryable_failures.is_empty() {
        body["retryable_failures"] = json!(result.retryable_failures);
    }
    if let [only] = results.as_slice() {
        if let (Some(body_map), Some(entry_map)) = (body.as_object_mut(), only.as_object()) {
            for (key, value) in entry_map {
                body_map.insert(key.clone(), value.clone());
            }
        }
    }

    json!({ "statusCode": 200, "body": body })
}

//! Per-identifier processing: lookup, orchestrated fetch, transform, score,
//! persist. Every identifier yields exactly one outcome; nothing is dropped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ClassifiedError, ErrorKind};
use crate::providers::FetchProfile;
use crate::store::{ProfileStore, StoreError};

use super::orchestrator::{AggregatedFailure, FallbackOrchestrator};
use super::profile::Identifier;
use super::scoring::{QualityScore, ScoringEngine};
use super::transform::transform;

/// Stage-tagged failure for a single identifier.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProcessingError {
    #[error("{0}")]
    Fetch(AggregatedFailure),
    #[error(transparent)]
    Transform(ClassifiedError),
    #[error(transparent)]
    Quality(ClassifiedError),
    #[error(transparent)]
    Store(ClassifiedError),
    #[error(transparent)]
    Processing(ClassifiedError),
}

impl ProcessingError {
    /// Whether the identifier should be reported for redelivery.
    pub fn is_redeliverable(&self) -> bool {
        match self {
            Self::Fetch(aggregated) => aggregated.is_retryable(),
            Self::Transform(_) | Self::Quality(_) => false,
            Self::Store(error) | Self::Processing(error) => error.is_redeliverable(),
        }
    }
}

/// Result of processing one identifier in one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingOutcome {
    pub identifier: Identifier,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
    pub already_processed: bool,
    pub newly_scraped: bool,
    /// Set when the invocation budget expired before this identifier got a
    /// literal outcome.
    pub abandoned: bool,
}

impl ProcessingOutcome {
    pub fn already_processed(identifier: Identifier) -> Self {
        Self {
            identifier,
            success: true,
            quality: None,
            error: None,
            already_processed: true,
            newly_scraped: false,
            abandoned: false,
        }
    }

    pub fn newly_scraped(identifier: Identifier, quality: QualityScore) -> Self {
        Self {
            identifier,
            success: true,
            quality: Some(quality),
            error: None,
            already_processed: false,
            newly_scraped: true,
            abandoned: false,
        }
    }

    /// Duplicate persistence: the record was written by someone else first,
    /// which counts as success with nothing new scraped.
    pub fn duplicate(identifier: Identifier, quality: QualityScore) -> Self {
        Self {
            identifier,
            success: true,
            quality: Some(quality),
            error: None,
            already_processed: true,
            newly_scraped: false,
            abandoned: false,
        }
    }

    pub fn failed(identifier: Identifier, error: ProcessingError) -> Self {
        Self {
            identifier,
            success: false,
            quality: None,
            error: Some(error),
            already_processed: false,
            newly_scraped: false,
            abandoned: false,
        }
    }

    pub fn abandoned(identifier: Identifier) -> Self {
        Self {
            identifier,
            success: false,
            quality: None,
            error: Some(ProcessingError::Processing(ClassifiedError::new(
                ErrorKind::ProcessingTimeout,
                "processing budget exhausted before this identifier completed",
            ))),
            already_processed: false,
            newly_scraped: false,
            abandoned: true,
        }
    }

    pub fn is_redeliverable(&self) -> bool {
        !self.success
            && self
                .error
                .as_ref()
                .map_or(self.abandoned, ProcessingError::is_redeliverable)
    }
}

/// Runs the full stage sequence for single identifiers.
pub struct ProfileProcessor<S, F> {
    store: Arc<S>,
    orchestrator: FallbackOrchestrator<F>,
    scoring: ScoringEngine,
}

impl<S, F> ProfileProcessor<S, F>
where
    S: ProfileStore,
    F: FetchProfile,
{
    pub fn new(store: Arc<S>, orchestrator: FallbackOrchestrator<F>, scoring: ScoringEngine) -> Self {
        Self {
            store,
            orchestrator,
            scoring,
        }
    }

    pub async fn process(&self, identifier: &Identifier) -> ProcessingOutcome {
        debug!(node_id = %identifier.node_id, "processing identifier");
        match self.run(identifier).await {
            Ok(outcome) => {
                info!(
                    node_id = %identifier.node_id,
                    newly_scraped = outcome.newly_scraped,
                    already_processed = outcome.already_processed,
                    "identifier processed"
                );
                outcome
            }
            Err(processing_error) => {
                warn!(node_id = %identifier.node_id, error = %processing_error, "identifier failed");
                self.record_failure(identifier, &processing_error).await;
                ProcessingOutcome::failed(identifier.clone(), processing_error)
            }
        }
    }

    async fn run(&self, identifier: &Identifier) -> Result<ProcessingOutcome, ProcessingError> {
        let stored = self
            .store
            .lookup(&identifier.node_id)
            .await
            .map_err(|err| ProcessingError::Store(err.classify()))?;

        if stored.as_ref().is_some_and(|record| record.already_scraped) {
            debug!(node_id = %identifier.node_id, "record already scraped, skipping fetch");
            return Ok(ProcessingOutcome::already_processed(identifier.clone()));
        }

        let username = identifier
            .username_hint()
            .map(str::to_string)
            .or_else(|| {
                stored
                    .as_ref()
                    .and_then(|record| record.username.clone())
                    .filter(|username| !username.trim().is_empty())
            })
            .ok_or_else(|| {
                ProcessingError::Processing(ClassifiedError::new(
                    ErrorKind::ProcessingInvalidInput,
                    format!("identifier {} has no username hint", identifier.node_id),
                ))
            })?;

        let fetched = self
            .orchestrator
            .fetch(&username)
            .await
            .map_err(ProcessingError::Fetch)?;

        // The resolved username becomes the trusted hint for transformation,
        // whichever source supplied it.
        let resolved = Identifier::with_username(identifier.node_id.clone(), username);
        let profile = transform(&fetched.payload, &resolved).map_err(ProcessingError::Transform)?;

        let score = self.scoring.score(&profile);
        if !score.meets_threshold {
            return Err(ProcessingError::Quality(ClassifiedError::for_provider(
                ErrorKind::QualityBelowThreshold,
                fetched.payload.provider,
                format!(
                    "quality score {} below threshold {}",
                    score.overall,
                    self.scoring.threshold()
                ),
            )));
        }

        match self.store.persist(&identifier.node_id, &profile, &score).await {
            Ok(()) => Ok(ProcessingOutcome::newly_scraped(identifier.clone(), score)),
            Err(StoreError::Duplicate) => {
                debug!(node_id = %identifier.node_id, "store reports duplicate, treating as no-op success");
                Ok(ProcessingOutcome::duplicate(identifier.clone(), score))
            }
            Err(err) => Err(ProcessingError::Store(err.classify())),
        }
    }

    /// Best-effort failure marker; store outages skip it since the write
    /// would fail the same way.
    async fn record_failure(&self, identifier: &Identifier, processing_error: &ProcessingError) {
        if matches!(processing_error, ProcessingError::Store(_)) {
            return;
        }
        if let Err(store_error) = self
            .store
            .mark_failed(&identifier.node_id, &processing_error.to_string())
            .await
        {
            error!(
                node_id = %identifier.node_id,
                error = %store_error,
                "failed to record failure on store"
            );
        }
    }
}

//! Invocation-scoped batch execution.
//!
//! Identifiers are independent units of work processed under a bounded worker
//! limit and one wall-clock budget for the whole invocation. When the budget
//! expires, unfinished identifiers are abandoned and reported as retryable
//! failures rather than silently dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::config::ProcessingConfig;
use crate::providers::FetchProfile;
use crate::store::ProfileStore;

use super::aggregator::{aggregate, BatchResult};
use super::processor::{ProcessingOutcome, ProfileProcessor};
use super::profile::Identifier;

#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub max_workers: usize,
    pub budget: Duration,
}

impl BatchLimits {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            budget: config.processing_budget,
        }
    }
}

/// Fans identifiers out to workers and aggregates their outcomes in input
/// order.
pub struct BatchRunner<S, F> {
    processor: Arc<ProfileProcessor<S, F>>,
    limits: BatchLimits,
}

impl<S, F> BatchRunner<S, F>
where
    S: ProfileStore + 'static,
    F: FetchProfile + 'static,
{
    pub fn new(processor: ProfileProcessor<S, F>, limits: BatchLimits) -> Self {
        Self {
            processor: Arc::new(processor),
            limits,
        }
    }

    pub async fn run(&self, identifiers: Vec<Identifier>) -> BatchResult {
        if identifiers.is_empty() {
            return aggregate(Vec::new());
        }

        let deadline = tokio::time::Instant::now() + self.limits.budget;
        let semaphore = Arc::new(Semaphore::new(self.limits.max_workers));
        let mut workers = JoinSet::new();

        for (index, identifier) in identifiers.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let processor = Arc::clone(&self.processor);
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                (index, processor.process(&identifier).await)
            });
        }

        let mut slots: Vec<Option<ProcessingOutcome>> =
            identifiers.iter().map(|_| None).collect();
        loop {
            match tokio::time::timeout_at(deadline, workers.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => slots[index] = Some(outcome),
                Ok(Some(Err(join_error))) => {
                    // The identifier keeps its slot and is reported abandoned.
                    error!(%join_error, "batch worker terminated abnormally");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        budget_secs = self.limits.budget.as_secs_f64(),
                        "processing budget exhausted, abandoning remaining identifiers"
                    );
                    workers.abort_all();
                    break;
                }
            }
        }

        let outcomes = identifiers
            .into_iter()
            .zip(slots)
            .map(|(identifier, slot)| {
                slot.unwrap_or_else(|| ProcessingOutcome::abandoned(identifier))
            })
            .collect();

        aggregate(outcomes)
    }
}

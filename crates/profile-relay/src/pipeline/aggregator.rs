//! Combines per-identifier outcomes into the batch response contract.

use serde::Serialize;

use super::processor::ProcessingOutcome;

/// The invocation response payload. Built once per invocation and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub profiles_scraped: usize,
    pub outcomes: Vec<ProcessingOutcome>,
    /// Identifiers whose failure classification is retryable, eligible for
    /// redelivery. Permanent failures are excluded.
    pub retryable_failures: Vec<String>,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.success)
    }
}

/// Counters follow the outcome sequence: `processed` counts identifiers that
/// actually ran (abandoned ones stay in the sequence but not the counter),
/// and input order is preserved for deterministic reporting.
pub fn aggregate(outcomes: Vec<ProcessingOutcome>) -> BatchResult {
    let processed = outcomes.iter().filter(|outcome| !outcome.abandoned).count();
    let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
    let profiles_scraped = outcomes
        .iter()
        .filter(|outcome| outcome.newly_scraped)
        .count();
    let retryable_failures = outcomes
        .iter()
        .filter(|outcome| outcome.is_redeliverable())
        .map(|outcome| outcome.identifier.node_id.clone())
        .collect();

    BatchResult {
        processed,
        succeeded,
        failed: processed - succeeded,
        profiles_scraped,
        outcomes,
        retryable_failures,
    }
}

//! Provider fallback orchestration.
//!
//! Providers are attempted strictly in the configured chain order. Transient
//! failures retry the same provider under exponential backoff; everything
//! else advances the chain immediately. The first structurally valid payload
//! stops the chain.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ProcessingConfig;
use crate::error::ClassifiedError;
use crate::providers::{FetchProfile, ProviderKind, RawProfile};

/// Per-attempt timeout and retry settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_delay,
            max_delay: config.max_retry_delay,
        }
    }

    /// Delay before retry number `attempt` (zero-based): base × 2^attempt,
    /// capped.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Record of one provider's participation in a fetch, in chain order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    pub provider: ProviderKind,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed { error: ClassifiedError },
}

/// First usable payload plus the attempt trail that led to it.
#[derive(Debug)]
pub struct FetchSuccess {
    pub payload: RawProfile,
    pub attempts: Vec<ProviderAttempt>,
}

/// Every provider in the chain failed; one classified error per provider in
/// attempt order. Reportable, not fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedFailure {
    pub attempts: Vec<ProviderAttempt>,
}

impl AggregatedFailure {
    /// Redeliverable when any provider failed transiently: a later attempt
    /// may reach it on a better day.
    pub fn is_retryable(&self) -> bool {
        self.attempts.iter().any(|attempt| match &attempt.outcome {
            AttemptOutcome::Failed { error } => error.is_transient_fetch(),
            AttemptOutcome::Success => false,
        })
    }
}

impl fmt::Display for AggregatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} providers failed", self.attempts.len())?;
        for attempt in &self.attempts {
            if let AttemptOutcome::Failed { error } = &attempt.outcome {
                write!(f, "; {}: {}", attempt.provider, error)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFailure {}

/// Tries each adapter in chain order until one yields a usable payload.
pub struct FallbackOrchestrator<F> {
    chain: Vec<F>,
    policy: RetryPolicy,
}

impl<F: FetchProfile> FallbackOrchestrator<F> {
    pub fn new(chain: Vec<F>, policy: RetryPolicy) -> Self {
        Self { chain, policy }
    }

    pub async fn fetch(&self, username: &str) -> Result<FetchSuccess, AggregatedFailure> {
        let mut attempts = Vec::with_capacity(self.chain.len());

        for provider in &self.chain {
            let started = Instant::now();
            match self.try_provider(provider, username).await {
                Ok(body) => {
                    let kind = provider.kind();
                    debug!(provider = %kind, %username, "provider returned a usable payload");
                    attempts.push(ProviderAttempt {
                        provider: kind,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::Success,
                    });
                    return Ok(FetchSuccess {
                        payload: RawProfile {
                            provider: kind,
                            body,
                        },
                        attempts,
                    });
                }
                Err(error) => {
                    warn!(provider = %provider.kind(), %username, %error, "provider failed, falling back");
                    attempts.push(ProviderAttempt {
                        provider: provider.kind(),
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::Failed { error },
                    });
                }
            }
        }

        Err(AggregatedFailure { attempts })
    }

    /// One provider's retry loop: transient failures back off and retry up to
    /// the attempt cap; anything else returns immediately.
    async fn try_provider(
        &self,
        provider: &F,
        username: &str,
    ) -> Result<serde_json::Value, ClassifiedError> {
        let mut attempt = 0;
        loop {
            let result =
                tokio::time::timeout(self.policy.request_timeout, provider.fetch(username)).await;

            let error = match result {
                Ok(Ok(body)) => return Ok(body),
                Ok(Err(error)) => error,
                Err(_) => ClassifiedError::for_provider(
                    crate::error::ErrorKind::FetchTimeout,
                    provider.kind(),
                    format!(
                        "no response within {}s",
                        self.policy.request_timeout.as_secs_f64()
                    ),
                ),
            };

            if !error.is_transient_fetch() || attempt + 1 >= self.policy.max_attempts {
                return Err(error);
            }

            let delay = self.policy.backoff(attempt);
            debug!(
                provider = %provider.kind(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "transient failure, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

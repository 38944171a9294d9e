//! Closed error taxonomy shared by every pipeline stage.
//!
//! Classification drives two decisions: whether the orchestrator retries an
//! attempt locally (transient fetch errors only), and whether a failed
//! identifier is reported back to the caller as eligible for redelivery.
//! Severity is reporting metadata and never influences control flow.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::providers::ProviderKind;

/// Reporting severity attached to every classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Informational,
    Warning,
    Critical,
}

/// Stage that produced an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    Fetch,
    Transform,
    Quality,
    Store,
    Processing,
}

/// The full closed set of failure kinds the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FetchConnection,
    FetchTimeout,
    FetchRateLimit,
    FetchAuthentication,
    FetchNotFound,
    TransformInvalidPayload,
    TransformMissingField,
    QualityBelowThreshold,
    StoreConnection,
    StoreTimeout,
    StoreDuplicate,
    ProcessingTimeout,
    ProcessingResourceExhausted,
    ProcessingInvalidInput,
}

impl ErrorKind {
    pub fn origin(self) -> ErrorOrigin {
        match self {
            Self::FetchConnection
            | Self::FetchTimeout
            | Self::FetchRateLimit
            | Self::FetchAuthentication
            | Self::FetchNotFound => ErrorOrigin::Fetch,
            Self::TransformInvalidPayload | Self::TransformMissingField => ErrorOrigin::Transform,
            Self::QualityBelowThreshold => ErrorOrigin::Quality,
            Self::StoreConnection | Self::StoreTimeout | Self::StoreDuplicate => ErrorOrigin::Store,
            Self::ProcessingTimeout
            | Self::ProcessingResourceExhausted
            | Self::ProcessingInvalidInput => ErrorOrigin::Processing,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::FetchConnection | Self::FetchTimeout | Self::FetchRateLimit => Severity::Warning,
            Self::FetchAuthentication => Severity::Critical,
            Self::FetchNotFound => Severity::Informational,
            Self::TransformInvalidPayload => Severity::Warning,
            Self::TransformMissingField => Severity::Critical,
            Self::QualityBelowThreshold => Severity::Warning,
            Self::StoreConnection | Self::StoreTimeout => Severity::Critical,
            Self::StoreDuplicate => Severity::Informational,
            Self::ProcessingTimeout | Self::ProcessingResourceExhausted => Severity::Critical,
            Self::ProcessingInvalidInput => Severity::Warning,
        }
    }

    /// Eligible for a same-provider retry inside the orchestrator.
    pub fn is_transient_fetch(self) -> bool {
        matches!(
            self,
            Self::FetchConnection | Self::FetchTimeout | Self::FetchRateLimit
        )
    }

    /// Eligible for redelivery: a later invocation may plausibly succeed.
    pub fn is_redeliverable(self) -> bool {
        matches!(
            self,
            Self::FetchConnection
                | Self::FetchTimeout
                | Self::FetchRateLimit
                | Self::StoreConnection
                | Self::StoreTimeout
                | Self::ProcessingTimeout
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchConnection => "fetch_connection",
            Self::FetchTimeout => "fetch_timeout",
            Self::FetchRateLimit => "fetch_rate_limit",
            Self::FetchAuthentication => "fetch_authentication",
            Self::FetchNotFound => "fetch_not_found",
            Self::TransformInvalidPayload => "transform_invalid_payload",
            Self::TransformMissingField => "transform_missing_field",
            Self::QualityBelowThreshold => "quality_below_threshold",
            Self::StoreConnection => "store_connection",
            Self::StoreTimeout => "store_timeout",
            Self::StoreDuplicate => "store_duplicate",
            Self::ProcessingTimeout => "processing_timeout",
            Self::ProcessingResourceExhausted => "processing_resource_exhausted",
            Self::ProcessingInvalidInput => "processing_invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classified failure, optionally attributed to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            provider: None,
            message: message.into(),
        }
    }

    pub fn for_provider(kind: ErrorKind, provider: ProviderKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            provider: Some(provider),
            message: message.into(),
        }
    }

    pub fn is_transient_fetch(&self) -> bool {
        self.kind.is_transient_fetch()
    }

    pub fn is_redeliverable(&self) -> bool {
        self.kind.is_redeliverable()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider {
            Some(provider) => write!(f, "[{}] {} ({})", self.kind, self.message, provider),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClassifiedError {}

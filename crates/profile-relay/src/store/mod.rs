//! Persistence-client contract.
//!
//! The store is an external collaborator; the pipeline only depends on this
//! trait so it can be exercised with in-memory implementations. Store errors
//! are classified into the taxonomy here: connection and timeout surface as
//! retryable, duplicate writes are a success-with-no-op.

pub mod rest;

pub use rest::RestProfileStore;

use std::future::Future;

use crate::error::{ClassifiedError, ErrorKind};
use crate::pipeline::profile::{CanonicalProfile, Identifier};
use crate::pipeline::scoring::QualityScore;

/// The store's view of a record before processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    pub node_id: String,
    pub username: Option<String>,
    pub already_scraped: bool,
}

impl StoredProfile {
    pub fn identifier(&self) -> Identifier {
        Identifier {
            node_id: self.node_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Storage abstraction; one implementation is created per process and shared
/// across identifiers and invocations.
pub trait ProfileStore: Send + Sync {
    fn lookup(
        &self,
        node_id: &str,
    ) -> impl Future<Output = Result<Option<StoredProfile>, StoreError>> + Send;

    fn persist(
        &self,
        node_id: &str,
        profile: &CanonicalProfile,
        score: &QualityScore,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn mark_failed(
        &self,
        node_id: &str,
        reason: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn candidates(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StoredProfile>, StoreError>> + Send;
}

/// Error enumeration reported by store implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store request timed out: {0}")]
    Timeout(String),
    #[error("record already persisted")]
    Duplicate,
}

impl StoreError {
    pub fn classify(&self) -> ClassifiedError {
        match self {
            Self::Connection(message) => {
                ClassifiedError::new(ErrorKind::StoreConnection, message.clone())
            }
            Self::Timeout(message) => ClassifiedError::new(ErrorKind::StoreTimeout, message.clone()),
            Self::Duplicate => {
                ClassifiedError::new(ErrorKind::StoreDuplicate, "record already persisted")
            }
        }
    }
}

//! Profile enrichment pipeline.
//!
//! Identifiers arrive from a queue message, a direct request, or a scheduled
//! batch. Each one is resolved against the persistence store, fetched from a
//! configured chain of interchangeable data providers, normalized into the
//! canonical profile schema, scored for completeness, and reported back as a
//! per-identifier outcome aggregated into a batch result.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod telemetry;

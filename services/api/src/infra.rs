use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use profile_relay::pipeline::{BatchResult, BatchRunner, Identifier};
use profile_relay::providers::FetchProfile;
use profile_relay::store::ProfileStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Batch runner plus the store handle the invocation adapter needs for
/// batch-mode candidate resolution.
pub(crate) struct Pipeline<S, F> {
    pub(crate) runner: BatchRunner<S, F>,
    pub(crate) store: Arc<S>,
}

impl<S, F> Pipeline<S, F>
where
    S: ProfileStore + 'static,
    F: FetchProfile + 'static,
{
    pub(crate) async fn run(&self, identifiers: Vec<Identifier>) -> BatchResult {
        self.runner.run(identifiers).await
    }
}

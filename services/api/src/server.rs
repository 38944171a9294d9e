use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use profile_relay::config::AppConfig;
use profile_relay::pipeline::{
    BatchLimits, BatchRunner, FallbackOrchestrator, Identifier, ProfileProcessor, RetryPolicy,
    ScoringEngine,
};
use profile_relay::providers::{provider_chain, ProviderAdapter};
use profile_relay::store::RestProfileStore;
use profile_relay::telemetry;

use crate::cli::{ProcessArgs, ServeArgs};
use crate::error::AppError;
use crate::infra::{AppState, Pipeline};
use crate::routes::with_pipeline_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = Arc::new(build_pipeline(&config)?);

    let app = with_pipeline_routes(pipeline)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        chain = ?config.providers.chain,
        "profile enrichment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) async fn run_process(args: ProcessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pipeline = build_pipeline(&config)?;

    let identifiers: Vec<Identifier> = match (args.username, args.node_ids.as_slice()) {
        (Some(username), [node_id]) => vec![Identifier::with_username(node_id.clone(), username)],
        (_, node_ids) => node_ids.iter().cloned().map(Identifier::new).collect(),
    };

    let result = pipeline.run(identifiers).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> Result<Pipeline<RestProfileStore, ProviderAdapter>, AppError> {
    let chain = provider_chain(config)?;
    let store = Arc::new(RestProfileStore::from_config(&config.store)?);

    let orchestrator =
        FallbackOrchestrator::new(chain, RetryPolicy::from_config(&config.processing));
    let scoring = ScoringEngine::new(config.processing.quality_threshold);
    let processor = ProfileProcessor::new(Arc::clone(&store), orchestrator, scoring);
    let runner = BatchRunner::new(processor, BatchLimits::from_config(&config.processing));

    Ok(Pipeline { runner, store })
}

use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_hiring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hiring_pipeline::config::AppConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::telemetry;
use hiring_pipeline::workflows::hiring::{HiringPipelineService, InMemoryHiringStore};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(InMemoryHiringStore::default());
    let service = Arc::new(HiringPipelineService::new(store, config.pipeline.clone()));

    let app = with_hiring_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        require_advance_comment = config.pipeline.require_advance_comment,
        "hiring pipeline service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

mod logging;
mod routes;

use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use counsel_agent::{OllamaBackend, VertexBackend};
use counsel_core::{
    agent::GenerationClient,
    config::Config,
    generator::SectionGenerator,
    metrics::MetricsCollector,
    orchestrator::ReportOrchestrator,
    pipeline::SectionPipeline,
    quality::QualityScorer,
};
use counsel_domains::persona_library;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use logging::{LogRing, LOG_RING_CAPACITY};

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<ReportOrchestrator>,
    pub scorer: QualityScorer,
    pub metrics: Arc<MetricsCollector>,
    pub start_time: Instant,
    pub analysis_count: AtomicU64,
    pub last_analysis: Mutex<Option<DateTime<Utc>>>,
    pub log_tx: broadcast::Sender<String>,
    pub log_ring: LogRing,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        orchestrator: Arc<ReportOrchestrator>,
        log_tx: broadcast::Sender<String>,
        log_ring: LogRing,
    ) -> Self {
        Self {
            scorer: orchestrator.pipeline().scorer().clone(),
            metrics: Arc::clone(orchestrator.metrics()),
            config,
            orchestrator,
            start_time: Instant::now(),
            analysis_count: AtomicU64::new(0),
            last_analysis: Mutex::new(None),
            log_tx,
            log_ring,
        }
    }
}

fn build_client(config: &Config) -> Arc<dyn GenerationClient> {
    match config.backend.as_str() {
        "ollama" => Arc::new(
            OllamaBackend::new(&config.ollama_url, &config.ollama_model)
                .with_timeout(config.request_timeout_s),
        ),
        _ => Arc::new(
            VertexBackend::new(
                &config.project_id,
                &config.location,
                &config.model,
                &config.vertex_access_token,
            )
            .with_timeout(config.request_timeout_s),
        ),
    }
}

fn build_orchestrator(
    config: &Config,
    client: Arc<dyn GenerationClient>,
) -> anyhow::Result<ReportOrchestrator> {
    let metrics = Arc::new(MetricsCollector::new(config.quality_threshold));
    let generator = SectionGenerator::new(client, Arc::clone(&metrics))
        .with_config(config.generation_config())
        .with_pricing(config.pricing());
    let pipeline = SectionPipeline::new(generator, QualityScorer::new(config.quality_threshold));
    Ok(ReportOrchestrator::new(pipeline, persona_library(), metrics)?)
}

pub(crate) fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/status", get(routes::get_status))
        // Analysis
        .route("/analyze", post(routes::analyze))
        .route("/validate", post(routes::validate))
        // Agents and metrics
        .route("/agents", get(routes::list_agents))
        .route("/metrics", get(routes::get_metrics))
        .route("/reset", post(routes::reset))
        // Logs
        .route("/logs", get(routes::sse_logs))
        .route("/logs/recent", get(routes::recent_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    let (log_tx, _) = broadcast::channel::<String>(1024);
    let log_ring: LogRing = Arc::new(Mutex::new(VecDeque::with_capacity(LOG_RING_CAPACITY)));
    logging::init(config.log_filter(), log_tx.clone(), Arc::clone(&log_ring));

    config.validate().context("invalid configuration")?;
    info!(
        backend = %config.backend,
        model = %config.active_model(),
        "starting counsel server"
    );

    let client = build_client(&config);
    if config.verify_on_startup {
        client
            .health_check()
            .await
            .context("generation backend health check failed")?;
        info!("generation backend verified");
    }

    let orchestrator = Arc::new(build_orchestrator(&config, client)?);
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        orchestrator,
        log_tx,
        log_ring,
    ));

    let app = build_app(state);

    let addr = format!("{}:{}", config.web_bind, config.web_port);
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

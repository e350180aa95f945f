use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use chrono::Utc;
use counsel_core::{AnalysisReport, PersonaKey, ValidationResult};
use counsel_domains::{agent_profiles, build_scenario, AnalysisRequest};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use crate::{logging, AppState};

// ── Error helper ──────────────────────────────────────────────────────────

pub(crate) fn internal(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!("internal error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn last_analysis(state: &AppState) -> Option<chrono::DateTime<Utc>> {
    *state
        .last_analysis
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

// ── Service info ──────────────────────────────────────────────────────────

pub(crate) async fn root() -> Json<Value> {
    Json(json!({
        "service": "Counsel Legal Analysis Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    }))
}

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "components": {
            "generation_backend": state.orchestrator.model_name(),
            "personas": format!("{} loaded", state.orchestrator.personas().len()),
            "validator": "active",
        },
    }))
}

pub(crate) async fn get_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    let agents: Vec<&str> = PersonaKey::ALL.iter().map(|k| k.as_str()).collect();
    Json(json!({
        "status": "operational",
        "initialized": true,
        "configuration": {
            "backend": config.backend,
            "project_id": config.project_id,
            "location": config.location,
            "model": config.active_model(),
            "quality_threshold": config.quality_threshold,
            "debug_mode": config.debug,
        },
        "analysis_count": state.analysis_count.load(Ordering::Relaxed),
        "last_analysis": last_analysis(&state),
        "available_agents": agents,
    }))
}

// ── Analysis ──────────────────────────────────────────────────────────────

pub(crate) async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, StatusCode> {
    let scenario = build_scenario(body);
    info!(case = %scenario.case_name, issues = scenario.key_issues.len(), "analysis requested");

    let orchestrator = Arc::clone(&state.orchestrator);
    let report = tokio::spawn(async move { orchestrator.generate_report(&scenario).await })
        .await
        .map_err(internal)?
        .map_err(internal)?;

    state.analysis_count.fetch_add(1, Ordering::Relaxed);
    *state
        .last_analysis
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

    spawn_quality_audit(Arc::clone(&state), report.clone());

    Ok(Json(report))
}

/// Re-score a finished report off the request path. Outcomes only reach
/// the log and the metrics history.
fn spawn_quality_audit(state: Arc<AppState>, report: AnalysisReport) {
    let handle = tokio::spawn(async move {
        let result = state.scorer.validate_report(&report);
        state.metrics.record_validation(&result);
        if result.passed {
            info!(
                case = %report.scenario.case_name,
                score = result.overall_score,
                "background quality check passed"
            );
        } else {
            warn!(
                case = %report.scenario.case_name,
                score = result.overall_score,
                issues = result.issues.len(),
                "background quality check failed"
            );
        }
    });
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            error!("background quality check aborted: {e}");
        }
    });
}

pub(crate) async fn validate(
    State(state): State<Arc<AppState>>,
    Json(report): Json<AnalysisReport>,
) -> Json<ValidationResult> {
    let result = state.scorer.validate_report(&report);
    state.metrics.record_validation(&result);
    Json(result)
}

// ── Agents / metrics ──────────────────────────────────────────────────────

pub(crate) async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "agents": agent_profiles(state.orchestrator.personas()) }))
}

pub(crate) async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.metrics.snapshot();
    Json(json!({
        "total_analyses": state.analysis_count.load(Ordering::Relaxed),
        "last_analysis": last_analysis(&state),
        "token_usage": snapshot.token_usage,
        "quality_metrics": snapshot.quality,
        "performance": {
            "average_processing_time": snapshot.average_processing_time,
            "success_rate": snapshot.success_rate,
            "total_attempts": snapshot.total_attempts,
        },
    }))
}

pub(crate) async fn reset(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.metrics.reset();
    state.analysis_count.store(0, Ordering::Relaxed);
    *state
        .last_analysis
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
    info!("counters and metrics reset");
    Json(json!({ "message": "System reset successfully" }))
}

// ── Logs ──────────────────────────────────────────────────────────────────

pub(crate) async fn sse_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.log_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok().map(|data| Ok(Event::default().data(data)))
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    )
}

pub(crate) async fn recent_logs(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "lines": logging::recent(&state.log_ring) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_app;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::Router;
    use counsel_core::agent::{Generation, GenerationClient, GenerationConfig};
    use counsel_core::config::Config;
    use counsel_core::generator::SectionGenerator;
    use counsel_core::metrics::MetricsCollector;
    use counsel_core::orchestrator::ReportOrchestrator;
    use counsel_core::pipeline::SectionPipeline;
    use counsel_core::quality::QualityScorer;
    use counsel_core::{GenerationError, TokenUsage};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    const SECTION: &str = "OVERVIEW\n\n\
        First, the plaintiff has strong claims of patent infringement supported by evidence. \
        Therefore, liability is probable because the defendant copied the protocol.\n\n\
        Second, damages may reach a reasonable royalty. Furthermore, the risk of an injunction is real. \
        Moreover, analysis shows licensing is a viable strategy given that competitors license widely.\n\n\
        - Recommendation: pursue a licensing action within a 90 day timeline\n\n\
        In conclusion, the overall position favors the plaintiff.";

    struct Fixed {
        fail: bool,
    }

    #[async_trait]
    impl GenerationClient for Fixed {
        async fn generate(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<Generation, GenerationError> {
            if self.fail {
                return Err(GenerationError::Fatal("401 unauthorized".into()));
            }
            Ok(Generation {
                text: SECTION.into(),
                usage: TokenUsage::new(200, 100),
            })
        }

        fn model_name(&self) -> String {
            "fixed".into()
        }
    }

    fn app(fail: bool) -> Router {
        let config = Arc::new(Config::from_vars(&HashMap::new()));
        let metrics = Arc::new(MetricsCollector::default());
        let generator = SectionGenerator::new(Arc::new(Fixed { fail }), Arc::clone(&metrics));
        let pipeline = SectionPipeline::new(generator, QualityScorer::default());
        let orchestrator = Arc::new(
            ReportOrchestrator::new(pipeline, counsel_domains::persona_library(), metrics).unwrap(),
        );
        let (log_tx, _) = broadcast::channel(16);
        let ring = Arc::new(Mutex::new(VecDeque::new()));
        build_app(Arc::new(AppState::new(config, orchestrator, log_tx, ring)))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn request() -> Value {
        json!({
            "case_name": "TechFlow v. DataSync",
            "complaint_text": "TechFlow plaintiff alleges DataSync defendant committed patent infringement.",
            "case_type": "IP",
            "urgency": "high"
        })
    }

    #[tokio::test]
    async fn root_reports_service() {
        let (status, body) = call(&app(false), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "operational");
    }

    #[tokio::test]
    async fn analyze_returns_full_report_and_updates_status() {
        let app = app(false);
        let (status, report) = call(&app, "POST", "/analyze", Some(request())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["sections"].as_array().unwrap().len(), 6);
        assert_eq!(report["sections"][0]["type"], "liability_assessment");
        assert_eq!(report["scenario"]["urgency_level"], "high");
        assert_eq!(report["scenario"]["parties_involved"], json!(["TechFlow", "DataSync"]));

        let (_, status) = call(&app, "GET", "/status", None).await;
        assert_eq!(status["analysis_count"], 1);
        assert!(status["last_analysis"].is_string());

        let (_, metrics) = call(&app, "GET", "/metrics", None).await;
        assert_eq!(metrics["total_analyses"], 1);
        assert!(metrics["token_usage"]["total_tokens"].as_u64().unwrap() >= 6 * 300);
    }

    #[tokio::test]
    async fn analyze_failure_is_500() {
        let (status, _) = call(&app(true), "POST", "/analyze", Some(request())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn analyze_rejects_missing_fields() {
        let (status, _) = call(&app(false), "POST", "/analyze", Some(json!({ "case_name": "x" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn validate_scores_posted_report() {
        let app = app(false);
        let (_, report) = call(&app, "POST", "/analyze", Some(request())).await;
        let (status, result) = call(&app, "POST", "/validate", Some(report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["section_scores"].as_object().unwrap().len(), 6);
        let score = result["overall_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(result["passed"], score >= 0.7);
    }

    #[tokio::test]
    async fn agents_lists_three_personas() {
        let (status, body) = call(&app(false), "GET", "/agents", None).await;
        assert_eq!(status, StatusCode::OK);
        let agents = body["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0]["type"], "litigation_expert");
        assert!(!agents[0]["capabilities"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_counters() {
        let app = app(false);
        call(&app, "POST", "/analyze", Some(request())).await;
        let (status, _) = call(&app, "POST", "/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, metrics) = call(&app, "GET", "/metrics", None).await;
        assert_eq!(metrics["total_analyses"], 0);
        assert!(metrics["last_analysis"].is_null());
        assert_eq!(metrics["token_usage"]["total_tokens"], 0);
    }

    #[tokio::test]
    async fn recent_logs_is_a_list() {
        let (status, body) = call(&app(false), "GET", "/logs/recent", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["lines"].is_array());
    }
}

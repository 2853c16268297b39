//! REST API server — expose the fallback gateway as an HTTP service.
//!
//! Endpoints:
//! - POST /llm/generate — Forward a chat request, falling back across candidate models
//! - GET  /health — Health check
//! - GET  /metrics — Request, attempt, and failure counters

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use llmgate_core::candidates::CandidateList;
use llmgate_core::config::GatewayConfig;
use llmgate_core::message::GenerateRequest;
use llmgate_core::normalize::Normalizer;
use llmgate_core::orchestrator::{FallbackOrchestrator, GenerationResult};
use llmgate_core::provider::UpstreamClient;

use crate::metrics::{SharedMetrics, new_metrics};
use crate::middleware::logging_middleware;
use crate::providers::HttpUpstream;

/// Shared API state. Read-only apart from the atomic counters.
pub struct ApiState {
    pub orchestrator: FallbackOrchestrator<Box<dyn UpstreamClient>>,
    pub normalizer: Normalizer,
    pub candidates: CandidateList,
    pub metrics: SharedMetrics,
}

impl ApiState {
    pub fn new(upstream: Box<dyn UpstreamClient>, config: &GatewayConfig) -> Self {
        Self {
            orchestrator: FallbackOrchestrator::new(upstream, config.max_output_tokens),
            normalizer: Normalizer::new(config.max_output_tokens),
            candidates: config.candidates.clone(),
            metrics: new_metrics(),
        }
    }

    /// State wired to the real OpenAI-compatible upstream.
    pub fn from_config(config: &GatewayConfig) -> llmgate_core::Result<Self> {
        let upstream = HttpUpstream::from_config(config)?;
        Ok(Self::new(Box::new(upstream), config))
    }
}

type SharedState = Arc<ApiState>;

// ─── Handlers ──────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(state.metrics.to_json())
}

async fn generate(
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Json<GenerationResult> {
    let request = state.normalizer.normalize(req);
    let report = state
        .orchestrator
        .generate_with_report(&request, &state.candidates)
        .await;

    state.metrics.record(&report);
    Json(report.result)
}

// ─── Server builder ────────────────────────────────────────

/// Build the API router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/llm/generate", post(generate))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(Arc::new(state));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Start the API server; stops on Ctrl-C.
pub async fn start_server(state: ApiState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("🌐 llmgate listening on http://{}", addr);

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str, candidates: &str, ceiling: &str) -> GatewayConfig {
        let vars = [
            ("OPENROUTER_API_KEY", "test-key".to_string()),
            ("OPENROUTER_BASE_URL", base_url.to_string()),
            ("MODEL_CANDIDATES", candidates.to_string()),
            ("REQUEST_TIMEOUT_SEC", "0.5".to_string()),
            ("MAX_OUTPUT_TOKENS", ceiling.to_string()),
        ];
        GatewayConfig::from_lookup(|name: &str| {
            vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    /// Start the gateway on an ephemeral port and return its base URL.
    async fn spawn_gateway(config: GatewayConfig) -> (String, tokio::sync::oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ApiState::from_config(&config).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(serve(listener, state, async {
            let _ = rx.await;
        }));

        (format!("http://{}", addr), tx)
    }

    async fn mount_model(server: &MockServer, model: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": model })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn completion(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    async fn post_generate(base: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/llm/generate", base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    fn hello(max_tokens: i64) -> Value {
        json!({
            "messages": [{"role": "user", "content": "hello"}],
            "max_tokens": max_tokens
        })
    }

    #[tokio::test]
    async fn test_generate_falls_back_to_next_model() {
        let upstream = MockServer::start().await;
        mount_model(&upstream, "primary", ResponseTemplate::new(503)).await;
        mount_model(&upstream, "secondary", completion("from secondary")).await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "primary,secondary", "600")).await;
        let resp = post_generate(&base, hello(50)).await;

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"text": "from secondary", "model_used": "secondary"}));
        assert_eq!(upstream.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_returns_error_type_on_exhaustion() {
        let upstream = MockServer::start().await;
        mount_model(&upstream, "a", ResponseTemplate::new(500)).await;
        mount_model(&upstream, "b", ResponseTemplate::new(429)).await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "a,b", "600")).await;
        let body: Value = post_generate(&base, hello(50)).await.json().await.unwrap();

        assert_eq!(body, json!({"error_type": "rate_limited"}));
    }

    #[tokio::test]
    async fn test_generate_timeout_is_classified() {
        let upstream = MockServer::start().await;
        mount_model(
            &upstream,
            "slow",
            completion("late").set_delay(Duration::from_secs(3)),
        )
        .await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "slow", "600")).await;
        let body: Value = post_generate(&base, hello(50)).await.json().await.unwrap();

        assert_eq!(body, json!({"error_type": "timeout"}));
    }

    #[tokio::test]
    async fn test_bad_request_upstream_stops_fallback() {
        let upstream = MockServer::start().await;
        mount_model(&upstream, "a", ResponseTemplate::new(400)).await;
        mount_model(&upstream, "b", completion("unreached")).await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "a,b", "600")).await;
        let body: Value = post_generate(&base, hello(50)).await.json().await.unwrap();

        assert_eq!(body, json!({"error_type": "failed"}));
        assert_eq!(upstream.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_candidates_makes_no_upstream_calls() {
        let upstream = MockServer::start().await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), " , ", "600")).await;
        let body: Value = post_generate(&base, hello(50)).await.json().await.unwrap();

        assert_eq!(body, json!({"error_type": "no_candidates"}));
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_tokens_clamped_to_ceiling() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "max_tokens": 100 })))
            .respond_with(completion("clamped"))
            .expect(2)
            .mount(&upstream)
            .await;

        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "m", "100")).await;
        let body: Value = post_generate(&base, hello(4000)).await.json().await.unwrap();
        assert_eq!(body["text"], "clamped");

        // Larger than any u32 is still clamped, not rejected.
        let resp = post_generate(&base, hello(5_000_000_000)).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["text"], "clamped");
    }

    #[tokio::test]
    async fn test_schema_violation_is_rejected_before_upstream() {
        let upstream = MockServer::start().await;
        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "m", "600")).await;

        let resp = post_generate(&base, hello(0)).await;
        assert!(resp.status().is_client_error());

        let resp = post_generate(&base, json!({"messages": "nope", "max_tokens": 5})).await;
        assert!(resp.status().is_client_error());

        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let upstream = MockServer::start().await;
        mount_model(&upstream, "m", completion("ok")).await;
        let (base, _stop) = spawn_gateway(config(&upstream.uri(), "m", "600")).await;

        post_generate(&base, hello(5)).await;

        let health: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let metrics: Value = reqwest::get(format!("{}/metrics", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(metrics["requests"]["total"], 1);
        assert_eq!(metrics["upstream_attempts"], 1);
        assert_eq!(metrics["success_by_model"]["m"], 1);
    }
}

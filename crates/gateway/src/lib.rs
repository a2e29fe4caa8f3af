//! HTTP API gateway for Mellivora.
//!
//! Exposes the honeypot chat endpoint, read-only session inspection, and
//! a health check. Built on Axum.
//!
//! Security layers applied:
//! - API-key authentication (`x-api-key` header, any casing) on all
//!   `/api` routes — validated before any session access
//! - Request body size limit (1 MB)
//! - Optional permissive CORS (the service typically runs behind an
//!   evaluation harness on a different origin)
//! - HTTP trace logging

pub mod api;
pub mod collector;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use mellivora_config::AppConfig;
use mellivora_core::ReportSink;
use mellivora_engine::{Extractor, HoneypotEngine};
use mellivora_providers::{ChatClient, LlmClassifier, LlmEngager};

use collector::{CollectorClient, LogOnlySink};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: HoneypotEngine,
    /// Expected inbound API key; `None` disables auth (local development)
    pub api_key: Option<String>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_allow_any: bool) -> Router {
    let api = Router::new()
        .route("/chat", post(api::chat_handler))
        .route("/sessions", get(api::list_sessions_handler))
        .route("/sessions/{id}", get(api::get_session_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    if cors_allow_any {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Start the gateway HTTP server: build the provider-backed
/// collaborators once, wire the engine, and serve.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let chat_client = ChatClient::from_config(&config.provider)?;
    let classifier = Arc::new(LlmClassifier::new(chat_client.clone()));
    let engager = Arc::new(LlmEngager::new(chat_client));

    let reporter: Arc<dyn ReportSink> = match CollectorClient::from_config(&config.collector) {
        Some(client) => Arc::new(client),
        None => {
            warn!("No collector URL configured — final reports will be logged only");
            Arc::new(LogOnlySink)
        }
    };

    if config.api_key.is_none() {
        warn!("No inbound API key configured — /api routes are unauthenticated");
    }

    let engine = HoneypotEngine::new(
        classifier,
        engager,
        reporter,
        Extractor::new(&config.extractor),
        config.engine.clone(),
    );

    let state = Arc::new(GatewayState {
        engine,
        api_key: config.api_key.clone(),
    });

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(state, config.gateway.cors_allow_any);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// API-key authentication for `/api` routes.
///
/// Header lookup is case-insensitive by construction, so both
/// `x-api-key` and `X-API-Key` spellings work. Runs before any session
/// access: 401 when the header is missing, 403 when it doesn't match.
async fn auth_middleware(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    match req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
    {
        None => {
            warn!("Request without API key rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(provided) if provided == expected => Ok(next.run(req).await),
        Some(_) => {
            warn!("Request with invalid API key rejected");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "mellivora",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

//! HTTP control surface for a running stream.
//!
//! Exposes the stream controller's commands and queries as JSON endpoints:
//!
//! ```text
//! GET  /health               liveness and version
//! GET  /api/status           streaming flag, mode, buffer fill, session length
//! POST /api/stream/start     begin generating
//! POST /api/stream/stop      stop generating
//! POST /api/mode             {"mode": "stressed"}
//! GET  /api/packets/latest   most recent packet of the session
//! GET  /api/session/stats    session summary
//! POST /api/session/save     export history to the session directory
//! POST /api/session/clear    reset history
//! GET  /api/telemetry        pipeline counters
//! ```

use crate::core::packet::DataPacket;
use crate::session::{ExportReceipt, SessionStore, SessionSummary};
use crate::stream::{StreamHandle, StreamStatus};
use crate::telemetry::TelemetryStats;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Shared server state
pub struct ServerState {
    handle: StreamHandle,
    store: Box<dyn SessionStore>,
}

impl ServerState {
    pub fn new(handle: StreamHandle, store: impl SessionStore + 'static) -> Self {
        Self {
            handle,
            store: Box::new(store),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Body of POST /api/mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

/// Response to a successful command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
}

impl CommandResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
            message: message.into(),
        })
    }
}

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/status
async fn status(State(state): State<Arc<ServerState>>) -> Json<StreamStatus> {
    Json(state.handle.status())
}

/// POST /api/stream/start
async fn start_stream(State(state): State<Arc<ServerState>>) -> Json<CommandResponse> {
    state.handle.start();
    CommandResponse::ok("Streaming started")
}

/// POST /api/stream/stop
async fn stop_stream(State(state): State<Arc<ServerState>>) -> Json<CommandResponse> {
    state.handle.stop();
    CommandResponse::ok("Streaming stopped")
}

/// POST /api/mode
async fn set_mode(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let mode = state
        .handle
        .set_mode(&request.mode)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "UNKNOWN_MODE", e.to_string()))?;

    Ok(CommandResponse::ok(format!("Mode set to {mode}")))
}

/// GET /api/packets/latest
async fn latest_packet(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<DataPacket>, ApiError> {
    state
        .handle
        .latest_packet()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "NO_DATA", "No packets in this session"))
}

/// GET /api/session/stats
async fn session_stats(State(state): State<Arc<ServerState>>) -> Json<SessionSummary> {
    Json(state.handle.session_summary())
}

/// POST /api/session/save
async fn save_session(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ExportReceipt>, ApiError> {
    state
        .handle
        .export_session(state.store.as_ref())
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_FAILED", e.to_string()))
}

/// POST /api/session/clear
async fn clear_session(State(state): State<Arc<ServerState>>) -> Json<CommandResponse> {
    state.handle.clear_session();
    CommandResponse::ok("Session cleared")
}

/// GET /api/telemetry
async fn telemetry(State(state): State<Arc<ServerState>>) -> Json<TelemetryStats> {
    Json(state.handle.telemetry().stats())
}

/// Build the router over shared state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/stream/start", post(start_stream))
        .route("/api/stream/stop", post(stop_stream))
        .route("/api/mode", post(set_mode))
        .route("/api/packets/latest", get(latest_packet))
        .route("/api/session/stats", get(session_stats))
        .route("/api/session/save", post(save_session))
        .route("/api/session/clear", post(clear_session))
        .route("/api/telemetry", get(telemetry))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    state: ServerState,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("EEG agent server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

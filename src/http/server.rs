//! HTTP server setup and the control API.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, CORS) and static assets
//! - Read config / write config / reset / status report
//! - Trigger hub broadcasts on successful writes

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::{BridgeConfig, ConfigStore, DisplayConfig, DisplayConfigPatch};
use crate::http::websocket::ws_handler;
use crate::hub::{BroadcastHub, PushEvent};
use crate::poller::{CaptionState, Connectivity};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub caption: Arc<CaptionState>,
    pub connectivity: Arc<Connectivity>,
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    /// Build the shared state graph from a server configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let store = Arc::new(ConfigStore::open(&config.store.path));
        let caption = Arc::new(CaptionState::new());
        let connectivity = Arc::new(Connectivity::new());
        let hub = Arc::new(BroadcastHub::new(store.clone(), caption.clone()));
        Self {
            store,
            caption,
            connectivity,
            hub,
        }
    }
}

/// Read-only status projection.
#[derive(Serialize)]
struct StatusReport {
    server: &'static str,
    propresenter_connected: bool,
    propresenter_api: String,
    clients_connected: usize,
    last_text: String,
}

/// HTTP server for the caption bridge.
pub struct BridgeServer {
    router: Router,
}

impl BridgeServer {
    /// Create a new server with the given configuration and state.
    pub fn new(config: &BridgeConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BridgeConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/config", get(get_config).post(write_config))
            .route("/api/config/reset", get(reset_config))
            .route("/api/status", get(get_status))
            .route("/ws", get(ws_handler))
            .with_state(state);

        if config.assets.enabled {
            router = router.fallback_service(ServeDir::new(&config.assets.dir));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /api/config`: the current snapshot, verbatim.
async fn get_config(State(state): State<AppState>) -> Json<DisplayConfig> {
    Json((*state.store.current()).clone())
}

/// `POST /api/config`: merge a partial document, persist, broadcast.
///
/// The broadcast runs inside the store's commit hook, so concurrent
/// writes notify subscribers in commit order. On persist failure
/// nothing is broadcast and the snapshot keeps its pre-write value.
async fn write_config(
    State(state): State<AppState>,
    Json(patch): Json<DisplayConfigPatch>,
) -> Response {
    let outcome = state
        .store
        .update(&patch, |merged| {
            state.hub.broadcast(&PushEvent::config(merged));
        })
        .await;
    match outcome {
        Ok(merged) => Json(json!({ "success": true, "config": &*merged })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Config write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /api/config/reset`: replace the snapshot with defaults,
/// persist best-effort, broadcast. Persist failure is logged by the
/// store, not reflected in the response.
async fn reset_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let defaults = state
        .store
        .reset(|defaults| {
            state.hub.broadcast(&PushEvent::config(defaults));
        })
        .await;
    Json(json!({ "success": true, "config": &*defaults }))
}

/// `GET /api/status`: read-only projection, no side effects.
async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        server: "running",
        propresenter_connected: state.connectivity.is_connected(),
        propresenter_api: state.store.current().external_api.clone(),
        clients_connected: state.hub.client_count(),
        last_text: state.caption.snapshot().text,
    })
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}

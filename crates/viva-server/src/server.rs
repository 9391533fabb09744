//! `VivaServer` — Axum HTTP + WebSocket server.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use viva_core::ids::InterviewId;
use viva_runtime::SessionSupervisor;
use viva_store::InterviewStore;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live session registry.
    pub supervisor: Arc<SessionSupervisor>,
    /// Persistence facade, for pre-upgrade interview lookups.
    pub store: Arc<InterviewStore>,
    /// Live WebSocket connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The interview server.
pub struct VivaServer {
    config: Arc<ServerConfig>,
    supervisor: Arc<SessionSupervisor>,
    store: Arc<InterviewStore>,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl VivaServer {
    /// Create a server over the given supervisor and store.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        supervisor: Arc<SessionSupervisor>,
        store: Arc<InterviewStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            supervisor,
            store,
            registry: Arc::new(ConnectionRegistry::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState {
            supervisor: self.supervisor.clone(),
            store: self.store.clone(),
            registry: self.registry.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws/{interview_id}", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve until the shutdown token fires.
    pub async fn serve(&self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        info!(addr = %listener.local_addr()?, "listening");

        let token = self.shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    }

    /// The shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.registry.count(),
        state.supervisor.active_count(),
    ))
}

/// GET /ws/{interview_id} — WebSocket upgrade for one interview session.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(interview_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let interview_id = InterviewId::from(interview_id);
    match state.store.get_interview(&interview_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "interview not found").into_response();
        }
        Err(err) => {
            error!(error = %err, "interview lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response();
        }
    }
    if state.registry.count() >= state.config.max_connections {
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let client_id = format!("conn_{}", uuid::Uuid::now_v7().simple());
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_ws_session(socket, client_id, interview_id, state))
}

//! Connection acceptor and HTTP surface
//!
//! One route upgrades to the signaling channel; every other path serves
//! static files for the demo client. Each upgraded socket gets its own
//! session task, peer endpoint, and event channel; nothing is shared
//! across sessions.

use crate::config::{AllowedOrigins, RelayConfig};
use crate::peer::PeerEndpoint;
use crate::signaling::{dispatcher, SignalingSession};
use crate::Result;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

/// Depth of the per-session engine event channel
const PEER_EVENT_BUFFER: usize = 64;

/// Signaling relay server
pub struct SignalingServer {
    /// Validated configuration shared with every session
    config: Arc<RelayConfig>,
}

impl SignalingServer {
    /// Create a server from a validated configuration
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Build the router: signaling upgrade, health check, static fallback
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.signaling_path, get(upgrade_handler))
            .route("/health", get(health_handler))
            .fallback_service(ServeDir::new(&self.config.static_dir))
            .with_state(Arc::clone(&self.config))
            .layer(
                tower::ServiceBuilder::new()
                    .layer(tower_http::trace::TraceLayer::new_for_http())
                    .layer(cors_layer(&self.config.allowed_origins)),
            )
    }

    /// Bind the listener and serve until ctrl-c
    pub async fn serve(self) -> Result<()> {
        let addr: std::net::SocketAddr = self
            .config
            .bind_address
            .parse()
            .map_err(|e| crate::Error::InvalidConfig(format!("Invalid bind address: {}", e)))?;

        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(
            "Signaling relay listening on http://{} (channel at {})",
            addr, self.config.signaling_path
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Signaling relay shut down");
        Ok(())
    }
}

fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    match allowed {
        // Any-origin is the documented trust boundary of this relay:
        // signaling clients are unauthenticated.
        AllowedOrigins::Any => CorsLayer::permissive(),
        AllowedOrigins::List(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!("Ignoring unparseable allowed origin {:?}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(origins))
        }
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn upgrade_handler(
    State(config): State<Arc<RelayConfig>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let AllowedOrigins::List(allowed) = &config.allowed_origins {
        let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
        if !origin.is_some_and(|o| allowed.iter().any(|a| a == o)) {
            warn!(origin = ?origin, "Rejecting signaling upgrade from disallowed origin");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_connection(socket, config))
}

/// Run one signaling session over an upgraded socket
///
/// The peer endpoint and the socket are released on every exit path: the
/// session is closed after the dispatch loop returns, and the socket
/// halves close when dropped.
async fn handle_connection(socket: WebSocket, config: Arc<RelayConfig>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Signaling connection accepted");

    let (event_tx, mut event_rx) = mpsc::channel(PEER_EVENT_BUFFER);

    let endpoint = match PeerEndpoint::connect(&session_id, &config, event_tx).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            // Setup failure aborts before the dispatch loop is entered.
            error!(session_id = %session_id, "Aborting connection: {}", e);
            return;
        }
    };

    let (sink, mut stream) = socket.split();
    let mut session = SignalingSession::new(session_id.clone(), endpoint, sink);

    match dispatcher::run(&mut session, &mut stream, &mut event_rx).await {
        Ok(()) => info!(session_id = %session_id, "Session ended"),
        Err(e) => error!(session_id = %session_id, "Session terminated: {}", e),
    }

    session.close().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

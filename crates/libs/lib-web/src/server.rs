//! # Server Setup
//!
//! Tracing initialization, router construction, and HTTP server startup.

// region: --- Imports
use crate::chat::{default_generator, Room};
use crate::handlers;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use lib_core::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub room: Arc<Room>,
}

impl AppState {
    /// Build the room from configuration, using the build's default generator.
    pub fn from_config(config: Config) -> Self {
        let generator = default_generator(&config.summarizer);
        let room = Arc::new(Room::new(config.history_limit, generator));
        Self { config, room }
    }
}

impl axum::extract::FromRef<AppState> for Arc<Room> {
    fn from_ref(state: &AppState) -> Self {
        state.room.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
// endregion: --- AppState

// region: --- Server Setup
/// Configure the global tracing subscriber from `LOG_LEVEL`.
pub fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = match log_level {
        "trace" | "debug" | "info" | "warn" | "error" => tracing_subscriber::EnvFilter::new(log_level),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {e}"))
}

/// Initialize and start the relay.
///
/// # Errors
///
/// Returns an error if configuration is invalid, tracing was already
/// initialized, or the listener cannot bind.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    init_tracing(&config.log_level)?;

    info!(" ROOM RELAY STARTING");
    info!(" Log level: {}", config.log_level);

    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    match config.history_limit {
        Some(limit) => info!(" Message history capped at {} messages", limit),
        None => info!(" Message history unbounded"),
    }
    info!(" Summaries via model {}", config.summarizer.model);

    let bind_address = config.bind_address.clone();
    let state = AppState::from_config(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!(" SERVER READY: http://{}", bind_address);
    log_server_info();

    // ConnectInfo is required by the WebSocket handler
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

/// Create the application router with all routes and layers.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/ws/room", get(handlers::websocket::room_websocket))
        .route("/api/room", get(handlers::room::get_room))
        .route("/api/room/messages", get(handlers::room::get_messages))
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Layers run outermost-last: stamp first, then span, then logging
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_failure(|error: tower_http::classify::ServerErrorsFailureClass, latency: std::time::Duration, _span: &tracing::Span| {
                    tracing::error!(
                        error = ?error,
                        latency_ms = latency.as_millis(),
                        "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                        error,
                        latency.as_millis()
                    );
                }),
        )
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log the public surface
fn log_server_info() {
    info!(" ROOM SOCKET:");
    info!("   • GET  /api/ws/room  (enterEvent, exitEvent, publishEvent, deleteEvent, getMessages, getId, requestGemini)");
    info!(" ROOM:");
    info!("   • GET  /api/room");
    info!("   • GET  /api/room/messages?limit={{n}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

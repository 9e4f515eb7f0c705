//! OMNIX realtime gateway binary.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use omnix_realtime::adapters::auth::JwtSessionValidator;
use omnix_realtime::adapters::http::{realtime_routes, RealtimeAppState};
use omnix_realtime::adapters::snapshot::InMemoryInventorySnapshot;
use omnix_realtime::adapters::websocket::{websocket_router, HubSettings, RealtimeHub, WebSocketState};
use omnix_realtime::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    init_tracing(&config.server);

    tracing::info!(
        environment = ?config.server.environment,
        "OMNIX realtime v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let validator = Arc::new(JwtSessionValidator::from_config(&config.auth));
    let snapshot = Arc::new(InMemoryInventorySnapshot::new());
    let hub = Arc::new(RealtimeHub::new(
        HubSettings::from_config(&config),
        validator,
        snapshot.clone(),
        snapshot,
    ));

    let app = Router::new()
        .merge(websocket_router().with_state(WebSocketState::new(hub.clone())))
        .merge(realtime_routes(RealtimeAppState::new(hub)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Realtime gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Realtime gateway stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        tracing::warn!("No CORS origins configured, allowing any origin");
        AllowOrigin::any()
    } else {
        tracing::info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("Received SIGTERM, shutting down"),
    }
}

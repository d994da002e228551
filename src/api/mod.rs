//! Health Companion REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/login` - Verify credentials, returns the session identity
//! - `POST /api/v1/auth/signup` - Create an account
//!
//! ## Vitals
//! - `POST /api/v1/ingest` - Single reading
//! - `POST /api/v1/ingest/batch` - Several readings, all-or-nothing
//! - `GET /api/v1/dashboard/:username` - Recent vitals and alerts
//! - `POST /api/v1/alerts/:id/resolve` - Mark an alert resolved
//!
//! ## Chat
//! - `POST /api/v1/chat` - Ask the health companion
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! Errors are returned as `{"detail": ..., "code": ..., "request_id": ...}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use health_companion::api::{serve, AppState};
//! use health_companion::config::ApiConfig;
//! use health_companion::storage::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(Database::open("./companion.db")?);
//!     let state = AppState::new(db, ApiConfig::default());
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::JsonBody;
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/signup", post(routes::auth::signup))
        // Vital routes
        .route("/ingest", post(routes::ingest::ingest_single))
        .route("/ingest/batch", post(routes::ingest::ingest_batch))
        .route("/dashboard/:username", get(routes::dashboard::get_dashboard))
        .route("/alerts/:id/resolve", post(routes::alerts::resolve_alert))
        // Chat routes
        .route("/chat", post(routes::chat::chat));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let static_dir = state.config.static_dir.clone();

    // Create shared state
    let shared_state = Arc::new(state);

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes);

    // Web UI at the root, when configured
    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir, "Serving static files");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Health companion API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Health companion API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

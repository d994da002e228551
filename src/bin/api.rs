//! Health Companion API Server
//!
//! Run with: cargo run --bin companion-api
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the default search path)
//! with environment overrides:
//! - `COMPANION_DATABASE_PATH` or `DATABASE_URL`: SQLite database file
//! - `COMPANION_API_HOST` / `COMPANION_API_PORT`: bind address (default: 0.0.0.0:8000)
//! - `COMPANION_STATIC_DIR`: serve a web UI from this directory
//! - `COMPANION_SEED_DEMO_USERS`: create demo accounts on an empty database (default: true)
//! - `GEMINI_API_KEY` / `GEMINI_MODEL`: enable the model-backed chat companion
//! - `COMPANION_LOG_LEVEL` / `COMPANION_LOG_FORMAT`: logging (`pretty` or `json`)
//! - `RUST_LOG`: overrides the log level filter

use anyhow::Context;
use clap::Parser;
use health_companion::agent::{GeminiClient, HealthAgent};
use health_companion::api::{serve, AppState};
use health_companion::auth::AuthService;
use health_companion::config::{Config, LoggingConfig};
use health_companion::storage::Database;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "companion-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Health companion API server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!(
        "Starting health companion API server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Database: {}", config.storage.database_path);

    // Initialize database
    let db = Arc::new(
        Database::open(&config.storage.database_path)
            .with_context(|| format!("opening database {}", config.storage.database_path))?,
    );

    if config.seed.demo_users {
        let auth = AuthService::new(Arc::clone(&db));
        let created = tokio::task::spawn_blocking(move || auth.seed_demo_users()).await??;
        if created > 0 {
            tracing::info!("Created {} demo accounts", created);
        }
    }

    // Chat agent: model-backed when a key is configured
    let agent = match config.agent.gemini() {
        Some(gemini) => {
            tracing::info!("Chat companion using model {}", gemini.model);
            let client = GeminiClient::new(gemini).context("creating Gemini client")?;
            HealthAgent::with_model(Arc::clone(&db), Arc::new(client))
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, chat companion uses built-in replies");
            HealthAgent::new(Arc::clone(&db))
        }
    }
    .context_limit(config.agent.context_limit);

    let state = AppState::with_agent(db, agent, config.api.clone());

    // Run server
    serve(state).await?;

    tracing::info!("Health companion API server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("health_companion={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::agent::HealthAgent;
use crate::auth::AuthService;
use crate::config::ApiConfig;
use crate::storage::Database;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Users, vitals and alerts
    pub db: Arc<Database>,
    /// Signup and login
    pub auth: AuthService,
    /// Chat companion
    pub agent: Arc<HealthAgent>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with a rule-based chat agent
    pub fn new(db: Arc<Database>, config: ApiConfig) -> Self {
        let agent = HealthAgent::new(Arc::clone(&db));
        Self::with_agent(db, agent, config)
    }

    /// Create state with a preconfigured chat agent.
    ///
    /// Model calls are cut off before the request timeout so `/chat` can still
    /// answer with a fallback reply.
    pub fn with_agent(db: Arc<Database>, agent: HealthAgent, config: ApiConfig) -> Self {
        let agent = agent.model_deadline(model_deadline(&config));
        Self {
            auth: AuthService::new(Arc::clone(&db)),
            db,
            agent: Arc::new(agent),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if a language model backs the chat endpoint
    pub fn has_model(&self) -> bool {
        self.agent.has_model()
    }
}

/// Four fifths of the request timeout
fn model_deadline(config: &ApiConfig) -> Duration {
    Duration::from_millis(config.request_timeout_secs.max(1) * 800)
}

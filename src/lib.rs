//! # Health Companion
//!
//! Vital-sign tracking and a chat companion for elderly users and their
//! caregivers: an Axum REST server backed by SQLite, plus a typed client
//! used by the `companion` command-line front end.
//!
//! ## Features
//!
//! - **Accounts**: signup and login with Argon2 password hashes
//! - **Vitals**: readings checked against normal bands, abnormal ones raise alerts
//! - **Dashboard**: recent readings and alerts per user
//! - **Chat**: a Gemini-backed companion with a rule-based fallback
//!
//! ## Modules
//!
//! - [`storage`]: SQLite persistence of users, vitals and alerts
//! - [`vitals`]: thresholds, latest-value summaries, chart series
//! - [`auth`]: signup validation, hashing, login
//! - [`agent`]: chat context, prompt, model call and fallback replies
//! - [`api`]: REST API server with Axum
//! - [`client`]: HTTP client and persisted session for the CLI
//! - [`config`]: TOML file and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use health_companion::storage::{Database, NewAlert, NewVital, Severity};
//! use health_companion::vitals::{assess, VitalKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./companion.db")?;
//!     let user = db.find_user("grandpa_joe")?.ok_or("no such user")?;
//!
//!     let assessment = assess(&VitalKind::HeartRate, 112.0);
//!     let alert = assessment
//!         .message
//!         .map(|m| NewAlert::new(Severity::Medium, m));
//!     db.record_vital(
//!         user.id,
//!         NewVital::new("heart_rate", 112.0, "bpm").abnormal(assessment.abnormal),
//!         alert,
//!     )?;
//!
//!     for alert in db.recent_alerts(user.id, 5)? {
//!         println!("{}: {}", alert.created_at, alert.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod storage;
pub mod vitals;

// Re-export top-level types for convenience
pub use storage::{
    Alert, Database, NewAlert, NewUser, NewVital, Role, Severity, StorageError, StorageResult,
    User, Vital,
};

pub use vitals::{assess, Assessment, LatestVitals, Reading, VitalKind};

pub use auth::{AuthError, AuthService, Session, SignupForm};

pub use agent::{AgentError, GeminiClient, GeminiConfig, HealthAgent, LanguageModel};

pub use api::{build_router, serve, ApiError, AppState};

pub use client::{ClientConfig, ClientError, CompanionClient, SessionStore};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig};

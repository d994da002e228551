//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::agent::GeminiConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    "./companion.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory served at `/` (the web UI), if any
    #[serde(default)]
    pub static_dir: Option<String>,

    /// Readings returned by the dashboard endpoint
    #[serde(default = "default_dashboard_vitals")]
    pub dashboard_vitals: usize,

    /// Alerts returned by the dashboard endpoint
    #[serde(default = "default_dashboard_alerts")]
    pub dashboard_alerts: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_dashboard_vitals() -> usize {
    50
}

fn default_dashboard_alerts() -> usize {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            static_dir: None,
            dashboard_vitals: default_dashboard_vitals(),
            dashboard_alerts: default_dashboard_alerts(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat companion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Gemini API key; no key means rule-based replies only
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_gemini_url")]
    pub base_url: String,

    #[serde(default = "default_agent_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_agent_retries")]
    pub max_retries: u32,

    /// Recent readings included in the chat context
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_agent_timeout() -> u64 {
    15_000
}

fn default_agent_retries() -> u32 {
    2
}

fn default_context_limit() -> usize {
    crate::agent::DEFAULT_CONTEXT_LIMIT
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: default_model(),
            base_url: default_gemini_url(),
            request_timeout_ms: default_agent_timeout(),
            max_retries: default_agent_retries(),
            context_limit: default_context_limit(),
        }
    }
}

impl AgentConfig {
    /// Gemini client settings, when an API key is configured
    pub fn gemini(&self) -> Option<GeminiConfig> {
        let api_key = self.gemini_api_key.as_ref().filter(|k| !k.trim().is_empty())?;
        Some(GeminiConfig {
            api_key: api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
            max_retries: self.max_retries,
        })
    }
}

/// Demo data configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Create the demo accounts on an empty database
    #[serde(default = "default_seed_demo_users")]
    pub demo_users: bool,
}

fn default_seed_demo_users() -> bool {
    true
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_users: default_seed_demo_users(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("health-companion").join("config.toml")),
            Some(PathBuf::from("/etc/health-companion/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment in production, a map in tests)
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage overrides
        if let Some(url) = lookup("DATABASE_URL") {
            if let Some(path) = sqlite_path_from_url(&url) {
                self.storage.database_path = path;
            }
        }
        if let Some(path) = lookup("COMPANION_DATABASE_PATH") {
            self.storage.database_path = path;
        }

        // API overrides
        if let Some(host) = lookup("COMPANION_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("COMPANION_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Some(dir) = lookup("COMPANION_STATIC_DIR") {
            self.api.static_dir = Some(dir);
        }

        // Agent overrides
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.agent.gemini_api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.agent.model = model;
        }

        // Seed overrides
        if let Some(seed) = lookup("COMPANION_SEED_DEMO_USERS") {
            self.seed.demo_users = seed.to_lowercase() != "false" && seed != "0";
        }

        // Logging overrides
        if let Some(level) = lookup("COMPANION_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("COMPANION_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Extract a file path from `sqlite:///path` or `sqlite://path`
fn sqlite_path_from_url(url: &str) -> Option<String> {
    let rest = url.strip_prefix("sqlite://")?;
    // sqlite:///./test.db keeps the relative path; sqlite:////abs/path keeps the absolute one
    let path = rest.strip_prefix('/').unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Health Companion Configuration
#
# Environment variables override these settings:
# - COMPANION_DATABASE_PATH (or DATABASE_URL=sqlite:///./companion.db)
# - COMPANION_API_HOST
# - COMPANION_API_PORT
# - COMPANION_STATIC_DIR
# - COMPANION_SEED_DEMO_USERS
# - GEMINI_API_KEY
# - GEMINI_MODEL
# - COMPANION_LOG_LEVEL
# - COMPANION_LOG_FORMAT

[storage]
# SQLite database file
database_path = "./companion.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8000

# Allowed CORS origins (empty = any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Serve a web UI from this directory at /
# static_dir = "./static"

# Dashboard sizes
dashboard_vitals = 50
dashboard_alerts = 5

[agent]
# Gemini API key. Without one the companion answers from built-in rules.
# gemini_api_key = ""

# Model name
model = "gemini-1.5-flash"

# API base URL
base_url = "https://generativelanguage.googleapis.com"

# Request timeout (ms) and attempts per message
request_timeout_ms = 15000
max_retries = 2

# Recent readings shared with the companion
context_limit = 5

[seed]
# Create grandpa_joe and nurse_sarah on an empty database
demo_users = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.api.dashboard_vitals, 50);
        assert_eq!(config.api.dashboard_alerts, 5);
        assert_eq!(config.agent.context_limit, 5);
        assert!(config.seed.demo_users);
        assert!(config.agent.gemini().is_none());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.storage.database_path, "./companion.db");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.api.static_dir.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9100\n\n[agent]\ngemini_api_key = \"k\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.agent.gemini().unwrap().api_key, "k");
    }

    #[test]
    fn test_bad_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:///./test.db"),
            ("COMPANION_API_PORT", "9000"),
            ("COMPANION_SEED_DEMO_USERS", "false"),
            ("GEMINI_API_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.storage.database_path, "./test.db");
        assert_eq!(config.api.port, 9000);
        assert!(!config.seed.demo_users);
        assert_eq!(config.agent.gemini().unwrap().api_key, "secret");
    }

    #[test]
    fn test_explicit_path_beats_database_url() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:///./test.db"),
            ("COMPANION_DATABASE_PATH", "/var/lib/companion.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.storage.database_path, "/var/lib/companion.db");
    }

    #[test]
    fn test_sqlite_url_forms() {
        assert_eq!(sqlite_path_from_url("sqlite:///./test.db").as_deref(), Some("./test.db"));
        assert_eq!(sqlite_path_from_url("sqlite:////data/app.db").as_deref(), Some("/data/app.db"));
        assert_eq!(sqlite_path_from_url("sqlite://app.db").as_deref(), Some("app.db"));
        assert!(sqlite_path_from_url("postgres://localhost/db").is_none());
    }

    #[test]
    fn test_blank_api_key_disables_model() {
        let mut config = AgentConfig::default();
        config.gemini_api_key = Some("  ".to_string());
        assert!(config.gemini().is_none());
    }
}

//! Health companion chat
//!
//! Answers a user's message using their recent vitals as context.
//!
//! ## Flow
//!
//! 1. Look up the user and their display name
//! 2. Load the most recent readings as a [`VitalContext`]
//! 3. With a model configured, send the persona prompt and return its reply
//! 4. Without one, or when the call fails or misses its deadline, answer
//!    from [`fallback`] rules

pub mod context;
pub mod fallback;
pub mod gemini;
pub mod prompt;

pub use context::VitalContext;
pub use gemini::{GeminiClient, GeminiConfig};

use crate::storage::{Database, StorageError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Readings included in the chat context
pub const DEFAULT_CONTEXT_LIMIT: usize = 5;

/// Text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier for logs
    fn name(&self) -> &str;

    /// Generate a reply for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Errors from the chat pipeline
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// The companion that answers chat messages
pub struct HealthAgent {
    db: Arc<Database>,
    model: Option<Arc<dyn LanguageModel>>,
    context_limit: usize,
    model_deadline: Option<Duration>,
}

impl HealthAgent {
    /// Agent that only uses the rule-based fallback
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            model: None,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            model_deadline: None,
        }
    }

    /// Agent backed by a language model
    pub fn with_model(db: Arc<Database>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            db,
            model: Some(model),
            context_limit: DEFAULT_CONTEXT_LIMIT,
            model_deadline: None,
        }
    }

    /// Builder method: how many recent readings go into the context
    pub fn context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit.max(1);
        self
    }

    /// Builder method: upper bound on one model call, retries included.
    /// Calling it again keeps the shorter deadline.
    pub fn model_deadline(mut self, deadline: Duration) -> Self {
        self.model_deadline = Some(match self.model_deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Name of the configured model, if any
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Display name and recent-readings context for a username
    pub fn gather_context(&self, username: &str) -> Result<(String, VitalContext), AgentError> {
        let Some(user) = self.db.find_user(username)? else {
            return Ok((username.to_string(), VitalContext::UserNotFound));
        };

        let vitals = self.db.recent_vitals(user.id, self.context_limit)?;
        Ok((
            user.display_name().to_string(),
            VitalContext::from_recent(vitals),
        ))
    }

    /// Reply to a chat message
    pub async fn chat(&self, username: &str, message: &str) -> Result<String, AgentError> {
        let (name, context) = self.gather_context(username)?;

        if let Some(model) = &self.model {
            let full_prompt = prompt::build_prompt(&name, &context.report(), message);
            tracing::debug!(username = %username, model = %model.name(), "Calling language model");

            let outcome = match self.model_deadline {
                Some(deadline) => tokio::time::timeout(deadline, model.generate(&full_prompt))
                    .await
                    .unwrap_or(Err(AgentError::Timeout)),
                None => model.generate(&full_prompt).await,
            };

            match outcome {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    tracing::warn!(
                        username = %username,
                        model = %model.name(),
                        error = %e,
                        "Model call failed, using fallback reply"
                    );
                }
            }
        }

        Ok(fallback::respond(
            message,
            &context,
            &name,
            &mut rand::thread_rng(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewUser, NewVital, Role};
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|_| AgentError::Unavailable)
        }
    }

    struct SilentModel;

    #[async_trait]
    impl LanguageModel for SilentModel {
        fn name(&self) -> &str {
            "silent"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, AgentError> {
            std::future::pending().await
        }
    }

    fn db_with_joe() -> Arc<Database> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let user = db
            .create_user(NewUser {
                username: "grandpa_joe".to_string(),
                password_hash: "x".to_string(),
                role: Role::Elderly,
                full_name: "Joe Smith".to_string(),
            })
            .unwrap();
        db.record_vital(user.id, NewVital::new("heart_rate", 72.0, "bpm"), None)
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_fallback_without_model() {
        let agent = HealthAgent::new(db_with_joe());
        assert!(!agent.has_model());

        let reply = agent.chat("grandpa_joe", "hello").await.unwrap();
        assert!(reply.starts_with("Hello Joe Smith!"));
    }

    #[tokio::test]
    async fn test_model_reply_and_prompt() {
        let model = Arc::new(ScriptedModel {
            reply: Ok("You're doing great, Joe 💙".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let agent = HealthAgent::with_model(db_with_joe(), model.clone());

        let reply = agent.chat("grandpa_joe", "How is my heart?").await.unwrap();
        assert_eq!(reply, "You're doing great, Joe 💙");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Name: Joe Smith"));
        assert!(prompts[0].contains("heart_rate = 72.0 bpm"));
    }

    #[tokio::test]
    async fn test_model_failure_falls_back() {
        let model = Arc::new(ScriptedModel {
            reply: Err(()),
            prompts: Mutex::new(Vec::new()),
        });
        let agent = HealthAgent::with_model(db_with_joe(), model);

        let reply = agent.chat("grandpa_joe", "hello").await.unwrap();
        assert!(reply.starts_with("Hello Joe Smith!"));
    }

    #[tokio::test]
    async fn test_model_past_deadline_falls_back() {
        let agent = HealthAgent::with_model(db_with_joe(), Arc::new(SilentModel))
            .model_deadline(Duration::from_secs(5))
            .model_deadline(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let reply = agent.chat("grandpa_joe", "hello").await.unwrap();
        assert!(reply.starts_with("Hello Joe Smith!"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unknown_user_uses_username() {
        let agent = HealthAgent::new(db_with_joe());
        let (name, context) = agent.gather_context("stranger").unwrap();
        assert_eq!(name, "stranger");
        assert_eq!(context, VitalContext::UserNotFound);

        let reply = agent.chat("stranger", "who am i").await.unwrap();
        assert!(reply.starts_with("You are stranger!"));
    }
}

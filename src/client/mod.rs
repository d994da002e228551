//! Health Companion REST API Client
//!
//! Typed HTTP client for the companion API, used by the `companion` CLI.
//! Requests are sent once; failures are reported, never retried.

pub mod session;

pub use session::{SessionError, SessionStore};

use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::api::dto::{
    AlertDto, BatchIngestRequest, BatchIngestResponse, ChatRequest, ChatResponse,
    DashboardResponse, HealthResponse, IngestRequest, IngestResponse, LoginRequest,
    ResolveAlertRequest, SignupResponse,
};
use crate::auth::{validate_login, Session, SignupForm};
use crate::vitals::Reading;

/// Message shown for any transport failure
pub const CONNECTION_ERROR: &str = "Connection error. Please try again.";

/// Companion API client
pub struct CompanionClient {
    client: Client,
    config: ClientConfig,
}

/// Configuration for the companion client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Result of posting readings one at a time
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Readings accepted before the first failure (or all of them)
    pub submitted: usize,
    /// Accepted readings flagged abnormal
    pub abnormal: usize,
    /// The failure that stopped submission, if any
    pub error: Option<ClientError>,
}

impl CompanionClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Log in and return the session identity
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        validate_login(username, password).map_err(|e| ClientError::Validation(e.to_string()))?;

        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        self.post("/api/v1/auth/login", &body).await
    }

    /// Create an account
    pub async fn signup(&self, form: &SignupForm) -> Result<SignupResponse, ClientError> {
        self.post("/api/v1/auth/signup", form).await
    }

    /// Ask the companion a question and return its reply
    pub async fn chat(&self, username: &str, message: &str) -> Result<String, ClientError> {
        if message.trim().is_empty() {
            return Err(ClientError::Validation("Please type a message".to_string()));
        }

        let body = ChatRequest {
            username: username.to_string(),
            message: message.to_string(),
        };
        let reply: ChatResponse = self.post("/api/v1/chat", &body).await?;
        Ok(reply.response)
    }

    /// Fetch recent vitals and alerts
    pub async fn dashboard(&self, username: &str) -> Result<DashboardResponse, ClientError> {
        let url = self.url(&format!("/api/v1/dashboard/{}", username));
        let response = self.client.get(&url).send().await.map_err(transport)?;
        decode(response).await
    }

    /// Record one reading
    pub async fn ingest(
        &self,
        username: &str,
        reading: &Reading,
    ) -> Result<IngestResponse, ClientError> {
        let body = IngestRequest {
            username: username.to_string(),
            vital_type: reading.vital_type.clone(),
            value: reading.value,
            unit: reading.unit.clone(),
        };
        self.post("/api/v1/ingest", &body).await
    }

    /// Record several readings atomically
    pub async fn ingest_batch(
        &self,
        username: &str,
        readings: &[Reading],
    ) -> Result<BatchIngestResponse, ClientError> {
        let body = BatchIngestRequest {
            username: username.to_string(),
            readings: readings.to_vec(),
        };
        self.post("/api/v1/ingest/batch", &body).await
    }

    /// Mark one of the user's alerts resolved
    pub async fn resolve_alert(
        &self,
        username: &str,
        alert_id: i64,
    ) -> Result<AlertDto, ClientError> {
        let body = ResolveAlertRequest {
            username: username.to_string(),
        };
        self.post(&format!("/api/v1/alerts/{}/resolve", alert_id), &body).await
    }

    /// Post readings one at a time, in order, stopping at the first failure.
    ///
    /// Readings accepted before the failure stay recorded.
    pub async fn submit_sequential(&self, username: &str, readings: &[Reading]) -> SubmitOutcome {
        let mut outcome = SubmitOutcome {
            submitted: 0,
            abnormal: 0,
            error: None,
        };

        for reading in readings {
            match self.ingest(username, reading).await {
                Ok(response) => {
                    outcome.submitted += 1;
                    if response.abnormal {
                        outcome.abnormal += 1;
                    }
                }
                Err(e) => {
                    outcome.error = Some(e);
                    break;
                }
            }
        }

        outcome
    }

    /// Full server health status
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    tracing::debug!(error = %e, "Request failed");
    ClientError::Connection
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        detail: error_detail(status, &text),
    })
}

/// Pull a displayable message out of an error body
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match &value["detail"] {
            serde_json::Value::String(detail) => return detail.clone(),
            // validation errors from some servers arrive as a list of {msg}
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items.iter().filter_map(|i| i["msg"].as_str()).collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("Request failed ({})", status)
    } else {
        body.to_string()
    }
}

/// Errors that can occur when talking to the companion API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected before sending
    #[error("{0}")]
    Validation(String),

    /// Server answered with an error; `detail` is its message
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("Connection error. Please try again.")]
    Connection,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Client setup failed: {0}")]
    Setup(String),
}

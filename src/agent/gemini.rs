//! Gemini REST API client
//!
//! Calls `models/{model}:generateContent` and returns the concatenated text
//! of the first candidate.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentError, LanguageModel};

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Model name (e.g., "gemini-1.5-flash")
    pub model: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum attempts per request
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_ms: 15_000,
            max_retries: 2,
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(AgentError::Request)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn classify(e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout
        } else if e.is_connect() {
            AgentError::Unavailable
        } else {
            AgentError::Request(e)
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let url = self.endpoint();
        let body = GenerateRequest::from_prompt(prompt);
        let mut last_error = AgentError::Unavailable;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                // Backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .query(&[("key", self.config.api_key.as_str())])
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = Self::classify(e);
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let parsed: GenerateResponse = response.json().await.map_err(Self::classify)?;
                return parsed.text().ok_or(AgentError::EmptyResponse);
            }

            if status.as_u16() == 429 {
                last_error = AgentError::RateLimited;
                continue;
            }

            let message = response.text().await.unwrap_or_default();
            let err = AgentError::Api {
                status: status.as_u16(),
                message,
            };
            if status.is_server_error() {
                last_error = err;
                continue;
            }
            return Err(err);
        }

        Err(last_error)
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(GenerateRequest::from_prompt("hello")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "Joe 💙"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello Joe 💙"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "test".to_string(),
            max_retries: 1,
            request_timeout_ms: 500,
            ..Default::default()
        })
        .unwrap();
        assert!(client.generate("hi").await.is_err());
    }
}

//! Groq chat-completion client
//!
//! Thin transport layer behind the [`LlmClient`] trait so the
//! interpreter can be tested with canned responses. Uses one shared
//! connection-pooled client for all calls.

use crate::error::{AgentError, Result};
use lazy_static::lazy_static;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const REQUEST_TIMEOUT_SECS: u64 = 30;

lazy_static! {
    static ref HTTP_CLIENT: Client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_else(|_| Client::new());
}

/// Model completion seam. The production impl talks to Groq; tests
/// supply canned or failing responses.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// One chat completion: system prompt plus a single user message.
    /// Returns the raw assistant text.
    async fn complete(&self, system_prompt: &str, user_payload: &str) -> Result<String>;
}

pub struct GroqClient {
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(api_key: String, model: String) -> Self {
        Self { api_key, model }
    }
}

#[async_trait::async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, system_prompt: &str, user_payload: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_payload},
            ],
            "temperature": 0.2,
            "max_tokens": 1024,
            "response_format": {"type": "json_object"},
        });

        debug!(model = %self.model, "sending chat completion request");

        let response = HTTP_CLIENT
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => {
                    warn!("model quota exhausted");
                    AgentError::QuotaExceeded(detail)
                }
                401 | 403 => {
                    error!("model auth rejected, check the API key");
                    AgentError::AuthFailure(detail)
                }
                code => {
                    error!(code, "model call failed");
                    AgentError::ExternalCall(format!("status {code}: {detail}"))
                }
            });
        }

        let payload: Value = response.json().await?;
        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AgentError::ExternalCall("completion response missing message content".to_string())
            })?;

        debug!(response_len = text.len(), "chat completion received");
        Ok(text.to_string())
    }
}

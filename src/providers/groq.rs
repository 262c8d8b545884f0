//! Groq provider implementation for Vypar
//!
//! Groq exposes an OpenAI-compatible `/chat/completions` endpoint. The
//! provider sends the classifier conversation there with a bearer API key.

use crate::config::GroqConfig;
use crate::error::{Result, VyparError};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Groq chat-completions provider
pub struct GroqProvider {
    client: Client,
    config: GroqConfig,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

/// Response body from `/chat/completions`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl GroqProvider {
    /// Create a new Groq provider
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured or the HTTP client cannot be built
    pub fn new(config: GroqConfig, timeout: Duration) -> Result<Self> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(VyparError::Provider(
                "Missing Groq API key (set GROQ_API_KEY)".to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vypar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VyparError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Groq provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: 0.0,
        };

        tracing::debug!("Sending Groq request: {} messages", messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Groq request failed: {}", e);
                VyparError::Provider(format!("Groq request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Groq returned error {}: {}", status, error_text);
            return Err(VyparError::Provider(format!(
                "Groq returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Groq response: {}", e);
            VyparError::Provider(format!("Failed to parse Groq response: {}", e))
        })?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| VyparError::Provider("Groq returned no choices".to_string()))?;

        Ok(match body.usage {
            Some(u) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(u.prompt_tokens, u.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        })
    }
}

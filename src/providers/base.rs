//! Base provider trait and common types for Vypar
//!
//! This module defines the Provider trait that all LLM providers must
//! implement, along with the chat message and completion types shared by
//! the Groq and Ollama implementations.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for conversation
///
/// Represents a chat message sent to, or received from, the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use vypar::providers::Message;
    ///
    /// let msg = Message::user("Create a customer");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use vypar::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Completion response with message and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The response message from the model
    pub message: Message,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }
}

/// Provider trait for LLM providers
///
/// # Examples
///
/// ```no_run
/// use vypar::providers::{Provider, Message, CompletionResponse};
/// use vypar::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(CompletionResponse::new(Message::assistant(last)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Completes a conversation with the given messages
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or response is invalid
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("a").role, "user");
        assert_eq!(Message::assistant("b").role, "assistant");
        let sys = Message::system("c");
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, "c");
    }

    #[test]
    fn test_message_missing_content_defaults_to_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(msg.content, "");
    }

    #[test]
    fn test_completion_response_with_usage() {
        let response =
            CompletionResponse::with_usage(Message::assistant("ok"), TokenUsage::new(10, 5));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        assert!(CompletionResponse::new(Message::assistant("x"))
            .usage
            .is_none());
    }
}

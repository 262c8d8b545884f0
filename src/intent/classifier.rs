//! Intent classifier
//!
//! Maps an utterance plus recent history to a raw `{category, intent, data}`
//! JSON value. Validation of that value is left to
//! [`IntentEnvelope::from_value`](super::IntentEnvelope::from_value) so the
//! dialogue engine decides how strict to be.

use crate::error::{Result, VyparError};
use crate::prompts::build_system_prompt;
use crate::providers::{Message, Provider};
use crate::storage::{Role, Turn};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Produces a candidate intent for an utterance
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify `text` given the conversation so far (oldest first)
    async fn classify(&self, text: &str, history: &[Turn]) -> Result<Value>;
}

/// Classifier backed by a chat-completion provider
pub struct LlmClassifier {
    provider: Arc<dyn Provider>,
    system_prompt: String,
}

impl LlmClassifier {
    /// Wrap a provider with the default classifier prompt
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            system_prompt: build_system_prompt(),
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn build_messages(&self, text: &str, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.as_str()));
        for turn in history {
            messages.push(match turn.role {
                Role::User => Message::user(turn.content.as_str()),
                Role::Assistant => Message::assistant(turn.content.as_str()),
            });
        }
        messages.push(Message::user(text));
        messages
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, text: &str, history: &[Turn]) -> Result<Value> {
        let messages = self.build_messages(text, history);
        tracing::debug!(
            provider = self.provider.name(),
            history = history.len(),
            "Classifying utterance"
        );

        let completion = self.provider.complete(&messages).await?;
        if let Some(usage) = completion.usage {
            tracing::debug!(
                "Classifier usage: prompt={}, completion={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        extract_json(&completion.message.content)
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Pull the JSON object out of a model reply
///
/// A fenced ```json block wins; otherwise the span from the first `{` to the
/// last `}` is parsed.
///
/// # Errors
///
/// Returns `VyparError::ClassificationFormat` when no parseable JSON is found.
///
/// # Examples
///
/// ```
/// use vypar::intent::extract_json;
///
/// let reply = "Sure!\n```json\n{\"category\": \"dealer\", \"intent\": \"get_weekly_sale\", \"data\": {}}\n```";
/// let value = extract_json(reply).unwrap();
/// assert_eq!(value["intent"], "get_weekly_sale");
/// ```
pub fn extract_json(reply: &str) -> Result<Value> {
    let candidate = fenced_block()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);

    let body = match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start < end => &candidate[start..=end],
        _ => candidate.trim(),
    };

    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Classifier reply is not valid JSON: {}", e);
        VyparError::ClassificationFormat(format!("Failed to parse intent from AI response: {}", e))
            .into()
    })
}

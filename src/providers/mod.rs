//! Provider module for Vypar
//!
//! This module contains the LLM provider abstraction used by the intent
//! classifier, with implementations for Groq and Ollama.

pub mod base;
pub mod groq;
pub mod ollama;

pub use base::{CompletionResponse, Message, Provider, TokenUsage};
pub use groq::GroqProvider;
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, VyparError};
use std::time::Duration;

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.provider_type.as_str() {
        "groq" => Ok(Box::new(GroqProvider::new(config.groq.clone(), timeout)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(
            config.ollama.clone(),
            timeout,
        )?)),
        other => Err(VyparError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

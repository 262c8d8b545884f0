//! Error types for Vypar
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Vypar operations
///
/// Covers configuration loading, classifier (provider) calls, intent
/// validation, dispatch to the backend, authentication and conversation
/// storage.
#[derive(Error, Debug)]
pub enum VyparError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (LLM API calls, authentication, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The classifier reply is not a usable `{category, intent, data}` object
    #[error("Invalid intent format from AI: {0}")]
    ClassificationFormat(String),

    /// Category outside the five supported business domains
    #[error("Invalid category: {0}")]
    UnknownCategory(String),

    /// Intent not handled by the category's domain handler
    #[error("Invalid {category} intent: {intent}")]
    UnknownIntent {
        /// Category the intent was routed to
        category: String,
        /// The unrecognised intent name
        intent: String,
    },

    /// Domain handler rejected the request before calling the backend
    #[error("{0}")]
    Handler(String),

    /// Backend system of record answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body or error description
        message: String,
    },

    /// Missing or malformed bearer credential
    #[error("{0}")]
    Authentication(String),

    /// Conversation storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VyparError {
    /// HTTP status code used when this error reaches the caller
    ///
    /// # Examples
    ///
    /// ```
    /// use vypar::error::VyparError;
    ///
    /// let err = VyparError::Authentication("Authorization header missing".into());
    /// assert_eq!(err.status_code(), 401);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Authentication(_) => 401,
            Self::UnknownCategory(_) | Self::UnknownIntent { .. } => 400,
            _ => 500,
        }
    }
}

/// Result type alias for Vypar operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Status code for an arbitrary error, looking through `anyhow` wrapping
pub fn status_code_of(err: &anyhow::Error) -> u16 {
    err.downcast_ref::<VyparError>()
        .map(VyparError::status_code)
        .unwrap_or(500)
}

//! Configuration management for Vypar
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, VyparError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure for Vypar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Classifier provider configuration (Groq, Ollama)
    pub provider: ProviderConfig,
    /// Backend system of record
    #[serde(default)]
    pub backend: BackendConfig,
    /// Slot-filling behaviour
    #[serde(default)]
    pub dialogue: DialogueConfig,
    /// Conversation store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider configuration
///
/// Specifies which LLM provider performs intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Groq (OpenAI-compatible) configuration
    #[serde(default)]
    pub groq: GroqConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Timeout applied to every classifier request (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_provider_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: "groq".to_string(),
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Groq provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// Model to use for classification
    #[serde(default = "default_groq_model")]
    pub model: String,

    /// API base URL (useful for tests and local mocks)
    #[serde(default = "default_groq_api_base")]
    pub api_base: String,

    /// API key; usually supplied through `GROQ_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_groq_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            model: default_groq_model(),
            api_base: default_groq_api_base(),
            api_key: None,
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the business API (e.g. `http://localhost:5000/api/v1`)
    #[serde(default = "default_backend_api_base")]
    pub api_base: String,

    /// Timeout for each backend call (seconds)
    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,
}

fn default_backend_api_base() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_backend_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_backend_api_base(),
            timeout_seconds: default_backend_timeout(),
        }
    }
}

/// Slot-filling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Number of recent turns loaded for each request
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Re-run the classifier over earlier user turns to backfill fields
    #[serde(default = "default_enrich")]
    pub enrich_from_history: bool,
}

fn default_history_window() -> usize {
    5
}

fn default_enrich() -> bool {
    true
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            enrich_from_history: default_enrich(),
        }
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig::default(),
            backend: BackendConfig::default(),
            dialogue: DialogueConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VyparError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| VyparError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("VYPAR_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("VYPAR_GROQ_MODEL") {
            self.provider.groq.model = model;
        }

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.provider.groq.api_key = Some(key);
        }

        if let Ok(host) = std::env::var("VYPAR_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("VYPAR_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(api_base) = std::env::var("VYPAR_BACKEND_URL") {
            self.backend.api_base = api_base;
        }

        if let Ok(timeout) = std::env::var("VYPAR_BACKEND_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid VYPAR_BACKEND_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(window) = std::env::var("VYPAR_HISTORY_WINDOW") {
            if let Ok(value) = window.parse() {
                self.dialogue.history_window = value;
            } else {
                tracing::warn!("Invalid VYPAR_HISTORY_WINDOW: {}", window);
            }
        }

        if let Ok(db_path) = std::env::var("VYPAR_DB_PATH") {
            tracing::debug!(db_path = %db_path, "Env override: VYPAR_DB_PATH");
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if let Ok(bind) = std::env::var("VYPAR_BIND") {
            self.server.bind = bind;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(db_path) = &cli.db_path {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if let crate::cli::Commands::Serve {
            bind: Some(bind), ..
        } = &cli.command
        {
            self.server.bind = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["groq", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(VyparError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(VyparError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(VyparError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.dialogue.history_window == 0 || self.dialogue.history_window > 50 {
            return Err(VyparError::Config(
                "dialogue.history_window must be between 1 and 50".to_string(),
            )
            .into());
        }

        url::Url::parse(&self.backend.api_base).map_err(|e| {
            VyparError::Config(format!(
                "Invalid backend.api_base '{}': {}",
                self.backend.api_base, e
            ))
        })?;

        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            VyparError::Config(format!("Invalid server.bind '{}': {}", self.server.bind, e))
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

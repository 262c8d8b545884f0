//! Test utilities for Vypar
//!
//! Scripted stand-ins for the classifier and the domain handlers, plus
//! temporary storage and configuration helpers.

use crate::config::Config;
use crate::dispatch::DomainHandler;
use crate::error::{Result, VyparError};
use crate::intent::{Category, IntentClassifier};
use crate::storage::{SqliteStorage, Turn};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// SQLite store in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_storage() -> (SqliteStorage, TempDir) {
    let dir = temp_dir();
    let storage = SqliteStorage::new_with_path(dir.path().join("conversations.db"))
        .expect("Failed to create sqlite storage");
    (storage, dir)
}

/// Write a config file into `dir` and return its path
pub fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).expect("Failed to write config file");
    path
}

/// Assert that an error contains the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(v) => panic!("Expected error containing '{}' but got Ok({:?})", expected, v),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration with an Ollama provider, which needs no API key
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "ollama".to_string();
    config
}

/// Classifier that answers from a fixed utterance table
///
/// Unknown utterances fail, which exercises the best-effort paths.
#[derive(Default)]
pub struct ScriptedClassifier {
    replies: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever `text` is classified
    pub fn on(mut self, text: &str, reply: Value) -> Self {
        self.replies.insert(text.to_string(), reply);
        self
    }

    /// Every utterance classified so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, text: &str, _history: &[Turn]) -> Result<Value> {
        self.calls.lock().expect("calls lock").push(text.to_string());
        self.replies
            .get(text)
            .cloned()
            .ok_or_else(|| VyparError::Provider(format!("no scripted reply for '{}'", text)).into())
    }
}

/// One call seen by a [`RecordingHandler`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Intent name
    pub intent: String,
    /// Data passed to the handler
    pub data: Map<String, Value>,
    /// Bearer token passed to the handler
    pub token: String,
}

/// Domain handler that records calls and returns a canned result
pub struct RecordingHandler {
    category: Category,
    reply: std::result::Result<Value, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingHandler {
    /// Handler that always succeeds with `reply`
    pub fn new(category: Category, reply: Value) -> Self {
        Self {
            category,
            reply: Ok(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Handler that always fails with `message`
    pub fn failing(category: Category, message: &str) -> Self {
        Self {
            category,
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl DomainHandler for RecordingHandler {
    fn category(&self) -> Category {
        self.category
    }

    async fn handle(&self, intent: &str, data: &Map<String, Value>, token: &str) -> Result<Value> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            intent: intent.to_string(),
            data: data.clone(),
            token: token.to_string(),
        });
        match &self.reply {
            Ok(v) => Ok(v.clone()),
            Err(message) => Err(VyparError::Handler(message.clone()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_temp_storage_creates_database() {
        let (storage, _dir) = temp_storage();
        assert!(storage.db_path().exists());
    }

    #[test]
    fn test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_scripted_classifier_records_calls() {
        let classifier = ScriptedClassifier::new().on("hi", json!({"ok": true}));
        assert_eq!(classifier.classify("hi", &[]).await.unwrap(), json!({"ok": true}));
        assert_error_contains(classifier.classify("bye", &[]).await, "no scripted reply");
        assert_eq!(classifier.calls(), vec!["hi".to_string(), "bye".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_handler() {
        let handler = RecordingHandler::failing(Category::Sales, "boom");
        assert_error_contains(handler.handle("create_sale", &Map::new(), "t").await, "boom");
        assert_eq!(handler.calls().len(), 1);
    }
}

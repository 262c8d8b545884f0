use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vypar::config::DialogueConfig;
use vypar::dispatch::{DomainHandler, IntentDispatcher};
use vypar::error::{Result, VyparError};
use vypar::intent::{Category, IntentClassifier};
use vypar::storage::{SqliteStorage, Turn};
use vypar::SlotFillingEngine;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("conversations.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

/// Classifier answering from a fixed utterance table
#[derive(Default)]
pub struct ScriptedClassifier {
    replies: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, text: &str, reply: Value) -> Self {
        self.replies.insert(text.to_string(), reply);
        self
    }

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

/// Handler that records every call and answers with a canned value
pub struct RecordingHandler {
    category: Category,
    reply: Value,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

#[allow(dead_code)]
impl RecordingHandler {
    pub fn new(category: Category, reply: Value) -> Self {
        Self {
            category,
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl DomainHandler for RecordingHandler {
    fn category(&self) -> Category {
        self.category
    }

    async fn handle(&self, intent: &str, data: &Map<String, Value>, _token: &str) -> Result<Value> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((intent.to_string(), data.clone()));
        Ok(self.reply.clone())
    }
}

/// Engine wired to scripted collaborators
#[allow(dead_code)]
pub struct TestEngine {
    pub engine: SlotFillingEngine,
    pub classifier: Arc<ScriptedClassifier>,
    pub handlers: Vec<Arc<RecordingHandler>>,
    pub storage: Arc<SqliteStorage>,
    _tmp: TempDir,
}

#[allow(dead_code)]
pub fn engine_with(
    classifier: ScriptedClassifier,
    handlers: Vec<RecordingHandler>,
    config: DialogueConfig,
) -> TestEngine {
    let (storage, tmp) = create_temp_storage();
    let storage = Arc::new(storage);
    let classifier = Arc::new(classifier);
    let handlers: Vec<Arc<RecordingHandler>> = handlers.into_iter().map(Arc::new).collect();

    let mut dispatcher = IntentDispatcher::new();
    for handler in &handlers {
        dispatcher.register(handler.clone());
    }

    let engine = SlotFillingEngine::new(
        storage.clone(),
        classifier.clone(),
        Arc::new(dispatcher),
        config,
    );

    TestEngine {
        engine,
        classifier,
        handlers,
        storage,
        _tmp: tmp,
    }
}

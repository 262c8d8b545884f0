//! Intent dispatcher
//!
//! Routes a complete envelope to the handler registered for its category and
//! normalises the handler's result for the caller.

pub mod backend;
pub mod business;
pub mod customer;
pub mod dealer;
pub mod product;
pub mod sales;

pub use backend::{BackendClient, Payload, Route};
pub use business::BusinessHandler;
pub use customer::CustomerHandler;
pub use dealer::DealerHandler;
pub use product::ProductHandler;
pub use sales::SalesHandler;

use crate::error::{Result, VyparError};
use crate::intent::{Category, IntentEnvelope};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Executes the intents of one category
#[async_trait]
pub trait DomainHandler: Send + Sync {
    /// Category this handler serves
    fn category(&self) -> Category;

    /// Validate `data` for `intent` and perform the backend call
    async fn handle(&self, intent: &str, data: &Map<String, Value>, token: &str) -> Result<Value>;
}

/// Category to handler routing table
#[derive(Default)]
pub struct IntentDispatcher {
    handlers: HashMap<Category, Arc<dyn DomainHandler>>,
}

impl IntentDispatcher {
    /// Dispatcher with no handlers registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the five backend handlers
    pub fn with_backend(backend: Arc<BackendClient>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(CustomerHandler::new(Arc::clone(&backend))));
        dispatcher.register(Arc::new(BusinessHandler::new(Arc::clone(&backend))));
        dispatcher.register(Arc::new(ProductHandler::new(Arc::clone(&backend))));
        dispatcher.register(Arc::new(SalesHandler::new(Arc::clone(&backend))));
        dispatcher.register(Arc::new(DealerHandler::new(backend)));
        dispatcher
    }

    /// Register a handler, replacing any previous one for its category
    pub fn register(&mut self, handler: Arc<dyn DomainHandler>) {
        self.handlers.insert(handler.category(), handler);
    }

    /// Route an envelope to its handler
    ///
    /// # Errors
    ///
    /// `UnknownCategory` when the category is unsupported or has no handler;
    /// otherwise whatever the handler returns.
    pub async fn dispatch(&self, envelope: &IntentEnvelope, token: &str) -> Result<Value> {
        let category: Category = envelope.category.parse()?;
        let handler = self
            .handlers
            .get(&category)
            .ok_or_else(|| VyparError::UnknownCategory(envelope.category.clone()))?;

        tracing::info!("Dispatching {}/{}", category, envelope.intent);
        handler.handle(&envelope.intent, &envelope.data, token).await
    }
}

/// Attach the conversation id to a handler result
///
/// Objects get a `conversation_id` key; anything else is wrapped as
/// `{result, conversation_id}`.
///
/// # Examples
///
/// ```
/// use vypar::dispatch::normalize_result;
/// use serde_json::json;
///
/// let out = normalize_result(json!({"id": 1}), "c-1");
/// assert_eq!(out, json!({"id": 1, "conversation_id": "c-1"}));
///
/// let out = normalize_result(json!([1, 2]), "c-1");
/// assert_eq!(out, json!({"result": [1, 2], "conversation_id": "c-1"}));
/// ```
pub fn normalize_result(result: Value, conversation_id: &str) -> Value {
    match result {
        Value::Object(mut map) => {
            map.insert(
                "conversation_id".to_string(),
                Value::String(conversation_id.to_string()),
            );
            Value::Object(map)
        }
        other => json!({ "result": other, "conversation_id": conversation_id }),
    }
}

/// Copy of `data` without null values
pub(crate) fn drop_nulls(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

//! Slot-filling engine
//!
//! One call to [`SlotFillingEngine::process`] handles one user turn:
//!
//! 1. load the recent window of the conversation
//! 2. rebuild any pending intent from the newest open assistant turn
//! 3. accept a suggestion when the user confirms it
//! 4. otherwise classify, merging into the pending intent when there is one
//! 5. validate the envelope shape
//! 6. recompute missing fields from the requirement table
//! 7. look for missing values in the user's older turns
//! 8. ask, suggest, or dispatch
//! 9. record the outcome
//!
//! No dialogue state lives in memory between calls; it is all rebuilt from
//! the conversation store.

use super::locks::ConversationLocks;
use super::recovery::{
    find_pending, is_confirmation, recover_fields, PendingIntent, STATUS_DISPATCHED, STATUS_ERROR,
};
use super::response::{
    MissingFieldsResponse, SuggestionResponse, TurnResponse, STATUS_MISSING_FIELDS,
};
use crate::config::DialogueConfig;
use crate::dispatch::{normalize_result, IntentDispatcher};
use crate::error::Result;
use crate::intent::{missing_fields, IntentClassifier, IntentEnvelope};
use crate::storage::{ConversationStore, HistoryFilter, Role, Turn, TurnMetadata};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use ulid::Ulid;

/// One inbound user turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Free-text utterance
    pub user_query: String,
    /// Conversation to continue; resolved from the user when absent
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Explicit field values supplied alongside the utterance
    #[serde(default)]
    pub additional_data: Option<Map<String, Value>>,
}

impl TurnRequest {
    /// Request for a fresh utterance
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Self::default()
        }
    }

    /// Continue an existing conversation
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Attach explicit field values
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.additional_data = Some(data);
        self
    }
}

/// The dialogue state machine
pub struct SlotFillingEngine {
    store: Arc<dyn ConversationStore>,
    classifier: Arc<dyn IntentClassifier>,
    dispatcher: Arc<IntentDispatcher>,
    config: DialogueConfig,
    locks: ConversationLocks,
}

impl SlotFillingEngine {
    /// Assemble an engine from its collaborators
    pub fn new(
        store: Arc<dyn ConversationStore>,
        classifier: Arc<dyn IntentClassifier>,
        dispatcher: Arc<IntentDispatcher>,
        config: DialogueConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            dispatcher,
            config,
            locks: ConversationLocks::new(),
        }
    }

    /// Conversation store the engine writes to
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Pick the conversation for a request
    ///
    /// An explicit id wins, then the user's most recent conversation, then a
    /// new ULID.
    pub fn resolve_conversation_id(&self, requested: Option<&str>, user_id: Option<&str>) -> String {
        if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        if let Some(user) = user_id {
            match self.store.latest_conversation_for_user(user) {
                Ok(Some(id)) => {
                    tracing::debug!("Continuing conversation {} for user", id);
                    return id;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Could not look up latest conversation: {}", e),
            }
        }

        Ulid::new().to_string()
    }

    /// Process one user turn
    ///
    /// # Errors
    ///
    /// Classification format errors, unknown categories or intents, and
    /// handler failures. Handler failures are recorded in the conversation
    /// before they are returned.
    pub async fn process(
        &self,
        request: TurnRequest,
        token: &str,
        user_id: Option<&str>,
    ) -> Result<TurnResponse> {
        let conversation_id =
            self.resolve_conversation_id(request.conversation_id.as_deref(), user_id);
        let _guard = self.locks.acquire(&conversation_id).await;

        let history = self.store.recent_history(
            HistoryFilter::conversation(&conversation_id),
            self.config.history_window,
        )?;
        let pending = find_pending(&history);
        tracing::debug!(
            conversation_id = %conversation_id,
            turns = history.len(),
            pending = pending.is_some(),
            "Loaded history"
        );

        self.record(&conversation_id, Role::User, &request.user_query, None, user_id);

        let envelope = match self.resolve_envelope(&request, &history, pending).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    "Intent resolution failed: {}",
                    e
                );
                self.record_error(&conversation_id, &e, user_id);
                return Err(e);
            }
        };
        let missing = missing_fields(&envelope.category, &envelope.intent, &envelope.data);

        if missing.is_empty() {
            return self
                .dispatch(envelope, &conversation_id, token, user_id)
                .await;
        }

        let suggested = self.suggest(&conversation_id, user_id, &missing);
        Ok(self.clarify(envelope, missing, suggested, &conversation_id, user_id))
    }

    async fn resolve_envelope(
        &self,
        request: &TurnRequest,
        history: &[Turn],
        pending: Option<PendingIntent>,
    ) -> Result<IntentEnvelope> {
        let additional = request.additional_data.as_ref();

        match pending {
            Some(PendingIntent {
                mut envelope,
                suggested_data: Some(suggested),
                ..
            }) if is_confirmation(&request.user_query) => {
                tracing::info!(
                    "Suggestion confirmed for {}/{}",
                    envelope.category,
                    envelope.intent
                );
                envelope.fill_missing(&suggested);
                if let Some(extra) = additional {
                    envelope.overwrite_with(extra);
                }
                Ok(envelope)
            }
            Some(PendingIntent { mut envelope, .. }) if additional.is_some() => {
                if let Some(extra) = additional {
                    envelope.overwrite_with(extra);
                }
                Ok(envelope)
            }
            Some(PendingIntent { mut envelope, .. }) => {
                let raw = self.classifier.classify(&request.user_query, history).await?;
                let fresh = IntentEnvelope::from_value(&raw)?;
                let filled = envelope.fill_missing(&fresh.data);
                tracing::debug!("Merged {} field(s) from the utterance", filled.len());

                if self.config.enrich_from_history {
                    self.enrich(&mut envelope, history).await;
                }
                Ok(envelope)
            }
            None => {
                let raw = self.classifier.classify(&request.user_query, history).await?;
                let mut envelope = IntentEnvelope::from_value(&raw)?;
                if let Some(extra) = additional {
                    envelope.fill_missing(extra);
                }
                Ok(envelope)
            }
        }
    }

    /// Re-run the classifier over earlier user turns to fill missing fields
    async fn enrich(&self, envelope: &mut IntentEnvelope, history: &[Turn]) {
        let earlier = history.iter().rev().filter(|t| t.role == Role::User);

        for turn in earlier.take(self.config.history_window) {
            let missing = missing_fields(&envelope.category, &envelope.intent, &envelope.data);
            if missing.is_empty() {
                break;
            }

            let found = match self.classifier.classify(&turn.content, &[]).await {
                Ok(raw) => IntentEnvelope::from_value(&raw),
                Err(e) => Err(e),
            };
            match found {
                Ok(found) => {
                    let wanted: Map<String, Value> = found
                        .data
                        .into_iter()
                        .filter(|(k, _)| missing.contains(k))
                        .collect();
                    let filled = envelope.fill_missing(&wanted);
                    if !filled.is_empty() {
                        tracing::debug!("Filled {:?} from turn {}", filled, turn.seq);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping enrichment from turn {}: {}", turn.seq, e);
                }
            }
        }
    }

    /// Values for `missing` from the user's full history
    fn suggest(
        &self,
        conversation_id: &str,
        user_id: Option<&str>,
        missing: &[String],
    ) -> Map<String, Value> {
        let filter = match user_id {
            Some(user) => HistoryFilter::user(user),
            None => HistoryFilter::conversation(conversation_id),
        };
        match self.store.full_history(filter) {
            Ok(turns) => recover_fields(&turns, missing),
            Err(e) => {
                tracing::warn!("History recovery skipped: {}", e);
                Map::new()
            }
        }
    }

    fn clarify(
        &self,
        envelope: IntentEnvelope,
        missing: Vec<String>,
        suggested: Map<String, Value>,
        conversation_id: &str,
        user_id: Option<&str>,
    ) -> TurnResponse {
        let stored_intent = envelope.to_value();

        let (response, message, metadata) = if suggested.is_empty() {
            let r = MissingFieldsResponse::new(missing.clone(), conversation_id, stored_intent.clone());
            let metadata = TurnMetadata {
                status: Some(STATUS_MISSING_FIELDS.to_string()),
                stored_intent: Some(stored_intent),
                suggested_data: None,
                missing_fields: Some(missing),
            };
            let message = r.message.clone();
            (TurnResponse::MissingFields(r), message, metadata)
        } else {
            let remaining: Vec<String> = missing
                .iter()
                .filter(|f| !suggested.contains_key(f.as_str()))
                .cloned()
                .collect();
            let r = SuggestionResponse::new(
                suggested.clone(),
                remaining,
                conversation_id,
                stored_intent.clone(),
            );
            let metadata = TurnMetadata {
                status: Some(r.status.clone()),
                stored_intent: Some(stored_intent),
                suggested_data: Some(suggested),
                missing_fields: Some(missing),
            };
            let message = r.message.clone();
            (TurnResponse::Suggestion(r), message, metadata)
        };

        tracing::info!(
            conversation_id = %conversation_id,
            status = response.status(),
            "{}/{} needs more input",
            envelope.category,
            envelope.intent
        );
        self.record(
            conversation_id,
            Role::Assistant,
            &message,
            Some(&metadata),
            user_id,
        );
        response
    }

    async fn dispatch(
        &self,
        envelope: IntentEnvelope,
        conversation_id: &str,
        token: &str,
        user_id: Option<&str>,
    ) -> Result<TurnResponse> {
        match self.dispatcher.dispatch(&envelope, token).await {
            Ok(result) => {
                let result = normalize_result(result, conversation_id);
                let metadata = TurnMetadata {
                    status: Some(STATUS_DISPATCHED.to_string()),
                    ..TurnMetadata::default()
                };
                self.record(
                    conversation_id,
                    Role::Assistant,
                    &result.to_string(),
                    Some(&metadata),
                    user_id,
                );
                tracing::info!(
                    conversation_id = %conversation_id,
                    "Dispatched {}/{}",
                    envelope.category,
                    envelope.intent
                );
                Ok(TurnResponse::Dispatched(result))
            }
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    "Dispatch of {}/{} failed: {}",
                    envelope.category,
                    envelope.intent,
                    e
                );
                self.record_error(conversation_id, &e, user_id);
                Err(e)
            }
        }
    }

    fn record_error(&self, conversation_id: &str, error: &anyhow::Error, user_id: Option<&str>) {
        let metadata = TurnMetadata {
            status: Some(STATUS_ERROR.to_string()),
            ..TurnMetadata::default()
        };
        self.record(
            conversation_id,
            Role::Assistant,
            &format!("Error: {}", error),
            Some(&metadata),
            user_id,
        );
    }

    fn record(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        metadata: Option<&TurnMetadata>,
        user_id: Option<&str>,
    ) {
        if let Err(e) = self
            .store
            .append(conversation_id, role, content, metadata, user_id)
        {
            tracing::warn!(
                "Failed to record {} turn in {}: {}",
                role,
                conversation_id,
                e
            );
        }
    }
}

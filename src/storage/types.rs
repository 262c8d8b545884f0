use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::VyparError;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// Vypar itself (clarifications, suggestions, results, errors)
    Assistant,
}

impl Role {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = VyparError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(VyparError::Storage(format!("Unknown role: {}", other))),
        }
    }
}

/// Structured markers attached to assistant turns
///
/// These carry the dialogue state between requests: the pending intent
/// snapshot, any values recovered from older turns and the field names the
/// user still has to supply. The state machine is rebuilt from them on every
/// request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// Response status that produced the turn (`missing_fields`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Raw pending-intent snapshot; parsed lazily so a bad snapshot is skippable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_intent: Option<Value>,

    /// Field values recovered from history and offered for confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_data: Option<Map<String, Value>>,

    /// Field names still unresolved when the turn was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

/// One immutable entry of a conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Insertion sequence, breaks timestamp ties
    pub seq: i64,
    /// Conversation the turn belongs to
    pub conversation_id: String,
    /// Authenticated user, when known
    pub user_id: Option<String>,
    /// Author
    pub role: Role,
    /// Human-readable text (or serialized result for dispatched turns)
    pub content: String,
    /// Dialogue markers, assistant turns only
    pub metadata: Option<TurnMetadata>,
    /// When the turn was written
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// True for assistant turns
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Summary row used by the history listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation identifier
    pub conversation_id: String,
    /// User the conversation belongs to, when known
    pub user_id: Option<String>,
    /// Number of turns written
    pub turn_count: usize,
    /// Timestamp of the newest turn
    pub last_activity: DateTime<Utc>,
}

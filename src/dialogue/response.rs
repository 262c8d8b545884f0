//! Turn outcomes returned to the caller

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a clarification asking for more fields
pub const STATUS_MISSING_FIELDS: &str = "missing_fields";
/// Status of a suggestion covering every missing field
pub const STATUS_SUGGESTED: &str = "suggested_data";
/// Status of a suggestion covering only some missing fields
pub const STATUS_SUGGESTED_PARTIAL: &str = "suggested_data_with_missing_fields";

const HOW_TO_PROCEED: &str = "Please send another request to /process-query with the same \
conversation_id and the missing fields in the additional_data field.";

/// Clarification asking the user for the named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingFieldsResponse {
    /// Always `missing_fields`
    pub status: String,
    /// Human-readable request
    pub message: String,
    /// Fields still needed, canonical order
    pub required_fields: Vec<String>,
    /// Conversation the turn belongs to
    pub conversation_id: String,
    /// Envelope collected so far
    pub stored_intent: Value,
    /// Instructions for the follow-up request
    pub how_to_proceed: String,
}

impl MissingFieldsResponse {
    /// Build the clarification for `missing`
    pub fn new(missing: Vec<String>, conversation_id: &str, stored_intent: Value) -> Self {
        Self {
            status: STATUS_MISSING_FIELDS.to_string(),
            message: format!(
                "Please provide the following information: {}",
                missing.join(", ")
            ),
            required_fields: missing,
            conversation_id: conversation_id.to_string(),
            stored_intent,
            how_to_proceed: HOW_TO_PROCEED.to_string(),
        }
    }
}

/// Values recovered from history, offered for confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    /// `suggested_data` or `suggested_data_with_missing_fields`
    pub status: String,
    /// Human-readable summary of the suggestion
    pub message: String,
    /// Recovered field values
    pub suggested_data: Map<String, Value>,
    /// Fields the suggestion does not cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_fields: Option<Vec<String>>,
    /// Conversation the turn belongs to
    pub conversation_id: String,
    /// Envelope collected so far
    pub stored_intent: Value,
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl SuggestionResponse {
    /// Build a suggestion; `remaining` empty means the suggestion is complete
    pub fn new(
        suggested: Map<String, Value>,
        remaining: Vec<String>,
        conversation_id: &str,
        stored_intent: Value,
    ) -> Self {
        let found = suggested
            .iter()
            .map(|(k, v)| format!("{}: {}", k, describe(v)))
            .collect::<Vec<_>>()
            .join(", ");

        let (status, message, remaining_fields) = if remaining.is_empty() {
            (
                STATUS_SUGGESTED,
                format!(
                    "I found this information from your earlier requests: {}. \
                     Reply 'yes' to use it, or send the correct values.",
                    found
                ),
                None,
            )
        } else {
            (
                STATUS_SUGGESTED_PARTIAL,
                format!(
                    "I found this information from your earlier requests: {}. \
                     Please also provide: {}",
                    found,
                    remaining.join(", ")
                ),
                Some(remaining),
            )
        };

        Self {
            status: status.to_string(),
            message,
            suggested_data: suggested,
            remaining_fields,
            conversation_id: conversation_id.to_string(),
            stored_intent,
        }
    }
}

/// Outcome of one processed turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TurnResponse {
    /// More fields are needed
    MissingFields(MissingFieldsResponse),
    /// Recovered values await confirmation
    Suggestion(SuggestionResponse),
    /// Handler result with `conversation_id` injected
    Dispatched(Value),
}

impl TurnResponse {
    /// Status string; dispatched results report `dispatched`
    pub fn status(&self) -> &str {
        match self {
            Self::MissingFields(r) => &r.status,
            Self::Suggestion(r) => &r.status,
            Self::Dispatched(_) => "dispatched",
        }
    }

    /// Conversation the response belongs to
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::MissingFields(r) => Some(&r.conversation_id),
            Self::Suggestion(r) => Some(&r.conversation_id),
            Self::Dispatched(v) => v.get("conversation_id").and_then(Value::as_str),
        }
    }

    /// JSON body sent to the caller
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_body() {
        let r = MissingFieldsResponse::new(
            vec!["name".to_string(), "email".to_string()],
            "c1",
            json!({"category": "customer"}),
        );
        let body = TurnResponse::MissingFields(r).to_value();
        assert_eq!(body["status"], "missing_fields");
        assert_eq!(body["message"], "Please provide the following information: name, email");
        assert_eq!(body["required_fields"], json!(["name", "email"]));
        assert_eq!(body["conversation_id"], "c1");
        assert!(body["how_to_proceed"].as_str().unwrap().contains("additional_data"));
    }

    #[test]
    fn test_complete_suggestion_has_no_remaining_fields() {
        let mut suggested = Map::new();
        suggested.insert("email".to_string(), json!("a@b.com"));
        let r = SuggestionResponse::new(suggested, vec![], "c1", json!({}));
        assert_eq!(r.status, STATUS_SUGGESTED);
        assert!(r.message.contains("email: a@b.com"));
        let body = serde_json::to_value(&r).unwrap();
        assert!(body.get("remaining_fields").is_none());
    }

    #[test]
    fn test_partial_suggestion_lists_remaining() {
        let mut suggested = Map::new();
        suggested.insert("gstRate".to_string(), json!(18));
        let r = SuggestionResponse::new(suggested, vec!["rate".to_string()], "c1", json!({}));
        assert_eq!(r.status, STATUS_SUGGESTED_PARTIAL);
        assert!(r.message.contains("gstRate: 18"));
        assert!(r.message.ends_with("Please also provide: rate"));
        assert_eq!(r.remaining_fields, Some(vec!["rate".to_string()]));
    }

    #[test]
    fn test_dispatched_status_and_id() {
        let r = TurnResponse::Dispatched(json!({"id": 1, "conversation_id": "c9"}));
        assert_eq!(r.status(), "dispatched");
        assert_eq!(r.conversation_id(), Some("c9"));
        assert_eq!(r.to_value()["id"], 1);
    }
}

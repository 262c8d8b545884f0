//! History scanning heuristics
//!
//! Everything here is best-effort: malformed turns are skipped and nothing
//! returns an error.

use crate::intent::IntentEnvelope;
use crate::storage::{Turn, TurnMetadata};

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Metadata status written on turns that close a dialogue cycle
pub const STATUS_DISPATCHED: &str = "dispatched";
/// Metadata status written on error turns
pub const STATUS_ERROR: &str = "error";

/// Dialogue state reconstructed from the newest open assistant turn
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIntent {
    /// Envelope snapshot waiting for more fields
    pub envelope: IntentEnvelope,
    /// Fields that were missing when the snapshot was written
    pub missing_fields: Vec<String>,
    /// Values offered for confirmation on that turn, if any
    pub suggested_data: Option<Map<String, Value>>,
}

fn closes_cycle(metadata: &TurnMetadata) -> bool {
    matches!(
        metadata.status.as_deref(),
        Some(STATUS_DISPATCHED) | Some(STATUS_ERROR)
    )
}

/// Find the pending intent in `history` (oldest first)
///
/// Scans newest to oldest for an assistant turn carrying a `missing_fields`
/// marker. A dispatched or error turn seen first means the last cycle is
/// closed and there is nothing pending. Turns whose snapshot does not parse
/// are skipped.
pub fn find_pending(history: &[Turn]) -> Option<PendingIntent> {
    for turn in history.iter().rev().filter(|t| t.is_assistant()) {
        let Some(metadata) = &turn.metadata else {
            continue;
        };
        if closes_cycle(metadata) {
            return None;
        }
        let Some(missing) = &metadata.missing_fields else {
            continue;
        };
        let Some(raw) = &metadata.stored_intent else {
            continue;
        };
        match IntentEnvelope::from_value(raw) {
            Ok(envelope) => {
                return Some(PendingIntent {
                    envelope,
                    missing_fields: missing.clone(),
                    suggested_data: metadata.suggested_data.clone(),
                })
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable stored intent in turn {}: {}", turn.seq, e);
            }
        }
    }
    None
}

fn confirmation_pattern() -> Option<&'static Regex> {
    static CONFIRM: OnceLock<Option<Regex>> = OnceLock::new();
    CONFIRM
        .get_or_init(|| {
            Regex::new(r"(?i)\b(yes|yeah|correct|confirm)\b|\buse\s+(that|this|the)\s+data\b").ok()
        })
        .as_ref()
}

/// True when the utterance accepts a suggestion
///
/// # Examples
///
/// ```
/// use vypar::dialogue::is_confirmation;
///
/// assert!(is_confirmation("Yes, use that data"));
/// assert!(is_confirmation("please use the data"));
/// assert!(!is_confirmation("yesterday's sales"));
/// ```
pub fn is_confirmation(text: &str) -> bool {
    confirmation_pattern()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn structured_data(turn: &Turn) -> Vec<Map<String, Value>> {
    let mut found = Vec::with_capacity(2);

    match serde_json::from_str::<Value>(&turn.content) {
        Ok(Value::Object(obj)) => {
            if let Some(Value::Object(data)) = obj.get("data") {
                found.push(data.clone());
            }
        }
        Ok(_) => {}
        Err(_) => {
            tracing::trace!("Turn {} content is not JSON", turn.seq);
        }
    }

    if let Some(Value::Object(intent)) = turn.metadata.as_ref().and_then(|m| m.stored_intent.as_ref()) {
        if let Some(Value::Object(data)) = intent.get("data") {
            found.push(data.clone());
        }
    }

    found
}

/// Recover values for `missing` from past assistant turns
///
/// `history` must be newest first. The first non-null value found for a
/// field wins; later (older) occurrences never overwrite it. The result only
/// contains fields named in `missing`.
pub fn recover_fields(history: &[Turn], missing: &[String]) -> Map<String, Value> {
    let mut recovered = Map::new();
    if missing.is_empty() {
        return recovered;
    }

    for turn in history.iter().filter(|t| t.is_assistant()) {
        for data in structured_data(turn) {
            for field in missing {
                if recovered.contains_key(field) {
                    continue;
                }
                if let Some(value) = data.get(field).filter(|v| !v.is_null()) {
                    tracing::debug!("Recovered {} from turn {}", field, turn.seq);
                    recovered.insert(field.clone(), value.clone());
                }
            }
        }
        if recovered.len() == missing.len() {
            break;
        }
    }

    recovered
}

//! Intent model
//!
//! - `envelope`: the `(category, intent, data)` triple and the category enum
//! - `requirements`: the field requirement table
//! - `classifier`: utterance to raw intent JSON

pub mod classifier;
pub mod envelope;
pub mod requirements;

pub use classifier::{extract_json, IntentClassifier, LlmClassifier};
pub use envelope::{has_value, Category, IntentEnvelope};
pub use requirements::{missing_fields, required_fields, requirement, Requirement};

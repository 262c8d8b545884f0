//! Intent envelope: the `(category, intent, data)` triple for one user goal

use crate::error::{Result, VyparError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Business domain an intent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Customer records and customer bills
    Customer,
    /// The dealer's own business profile
    Business,
    /// Product catalogue
    Product,
    /// Sales and invoices
    Sales,
    /// Dealer-wide reports
    Dealer,
}

impl Category {
    /// Every category, in catalogue order
    pub const ALL: [Category; 5] = [
        Category::Customer,
        Category::Business,
        Category::Product,
        Category::Sales,
        Category::Dealer,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Business => "business",
            Self::Product => "product",
            Self::Sales => "sales",
            Self::Dealer => "dealer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = VyparError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VyparError::UnknownCategory(s.to_string()))
    }
}

/// One classified user goal
///
/// The category stays a plain string here: an unsupported category is a
/// dispatch-time failure, not a reason to reject the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentEnvelope {
    /// Category name as produced by the classifier
    pub category: String,
    /// Category-scoped intent name
    pub intent: String,
    /// Field values collected so far
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl IntentEnvelope {
    /// Build an envelope
    pub fn new(
        category: impl Into<String>,
        intent: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            category: category.into(),
            intent: intent.into(),
            data,
        }
    }

    /// Validate raw classifier output
    ///
    /// The value must be an object with `category`, `intent` and `data` keys.
    /// `data` may be `null`, which is read as an empty object.
    ///
    /// # Errors
    ///
    /// Returns `VyparError::ClassificationFormat` when a key is missing or has
    /// the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use vypar::intent::IntentEnvelope;
    /// use serde_json::json;
    ///
    /// let env = IntentEnvelope::from_value(&json!({
    ///     "category": "customer",
    ///     "intent": "create_customer",
    ///     "data": {"name": "Bob"}
    /// })).unwrap();
    /// assert_eq!(env.data["name"], "Bob");
    ///
    /// assert!(IntentEnvelope::from_value(&json!({"category": "customer"})).is_err());
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            VyparError::ClassificationFormat("expected a JSON object".to_string())
        })?;

        for key in ["category", "intent", "data"] {
            if !obj.contains_key(key) {
                return Err(VyparError::ClassificationFormat(format!("missing key: {}", key)).into());
            }
        }

        let category = obj["category"].as_str().ok_or_else(|| {
            VyparError::ClassificationFormat("category must be a string".to_string())
        })?;
        let intent = obj["intent"].as_str().ok_or_else(|| {
            VyparError::ClassificationFormat("intent must be a string".to_string())
        })?;
        let data = match &obj["data"] {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(VyparError::ClassificationFormat(
                    "data must be an object".to_string(),
                )
                .into())
            }
        };

        Ok(Self::new(category, intent, data))
    }

    /// Serialize back to the JSON shape stored in turn metadata
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "category": self.category,
            "intent": self.intent,
            "data": self.data,
        })
    }

    /// Copy non-null values for fields that are absent or null here
    ///
    /// Returns the names of the fields that were filled.
    pub fn fill_missing(&mut self, values: &Map<String, Value>) -> Vec<String> {
        let mut filled = Vec::new();
        for (field, value) in values {
            if value.is_null() || has_value(&self.data, field) {
                continue;
            }
            self.data.insert(field.clone(), value.clone());
            filled.push(field.clone());
        }
        filled
    }

    /// Copy every non-null value, replacing what is already present
    pub fn overwrite_with(&mut self, values: &Map<String, Value>) {
        for (field, value) in values {
            if !value.is_null() {
                self.data.insert(field.clone(), value.clone());
            }
        }
    }
}

/// True when `field` is present with a non-null value
pub fn has_value(data: &Map<String, Value>, field: &str) -> bool {
    data.get(field).map(|v| !v.is_null()).unwrap_or(false)
}

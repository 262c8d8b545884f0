//! Business handler: the dealer's own business profile

use super::backend::{BackendClient, Payload, Route};
use super::{drop_nulls, DomainHandler};
use crate::error::{Result, VyparError};
use crate::intent::{has_value, required_fields, Category};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Forwards business intents to the backend
pub struct BusinessHandler {
    backend: Arc<BackendClient>,
}

impl BusinessHandler {
    /// Create a handler over a shared backend client
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

/// Resolve a business intent to a backend route
pub fn route(intent: &str, data: &Map<String, Value>) -> Result<Route> {
    match intent {
        "register_business" => {
            let complete = required_fields("business", "register_business")
                .iter()
                .all(|f| has_value(data, f));
            if !complete {
                return Err(VyparError::Handler(
                    "All required fields must be provided for registering a business".to_string(),
                )
                .into());
            }
            Ok(Route::new(
                Method::PUT,
                "/dealer/business-register",
                Payload::Json(Value::Object(data.clone())),
            ))
        }
        "update_business" => Ok(Route::new(
            Method::PUT,
            "/dealer/business-update",
            Payload::Json(Value::Object(drop_nulls(data))),
        )),
        other => Err(VyparError::UnknownIntent {
            category: Category::Business.to_string(),
            intent: other.to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl DomainHandler for BusinessHandler {
    fn category(&self) -> Category {
        Category::Business
    }

    async fn handle(&self, intent: &str, data: &Map<String, Value>, token: &str) -> Result<Value> {
        let route = route(intent, data)?;
        self.backend.send(route, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_requires_all_fields() {
        let partial = json!({"name": "Shop", "phone": "1"});
        let err = route("register_business", partial.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("All required fields"));

        let full = json!({
            "name": "Shop", "phone": "1", "address": "Main St", "pincode": "560001",
            "state": "KA", "businessCategory": "retail", "businessType": "sole"
        });
        let r = route("register_business", full.as_object().unwrap()).unwrap();
        assert_eq!(r.path, "/dealer/business-register");
        assert_eq!(r.method, Method::PUT);
    }

    #[test]
    fn test_update_sends_only_present_fields() {
        let data = json!({"state": "KA", "gstNumber": null});
        let r = route("update_business", data.as_object().unwrap()).unwrap();
        assert_eq!(r.payload, Payload::Json(json!({"state": "KA"})));
    }

    #[test]
    fn test_unknown_intent() {
        assert!(route("close_business", &Map::new()).is_err());
    }
}

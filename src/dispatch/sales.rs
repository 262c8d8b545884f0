//! Sales handler: sales and invoices

use super::backend::{BackendClient, Payload, Route};
use super::DomainHandler;
use crate::error::{Result, VyparError};
use crate::intent::{has_value, required_fields, Category};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

const PRODUCT_ITEM_FIELDS: [&str; 4] = ["productId", "quantity", "rate", "gstApplied"];

/// Forwards sales intents to the backend
pub struct SalesHandler {
    backend: Arc<BackendClient>,
}

impl SalesHandler {
    /// Create a handler over a shared backend client
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

fn validate_sale(data: &Map<String, Value>) -> Result<()> {
    let required = required_fields("sales", "create_sale");
    if !required.iter().all(|f| has_value(data, f)) {
        return Err(VyparError::Handler(format!(
            "Missing required fields. Required: {}",
            required.join(", ")
        ))
        .into());
    }

    let products = match data.get("products") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(VyparError::Handler(
                "At least one product is required for a sale".to_string(),
            )
            .into())
        }
    };

    for (i, item) in products.iter().enumerate() {
        let complete = item
            .as_object()
            .map(|obj| PRODUCT_ITEM_FIELDS.iter().all(|f| obj.contains_key(*f)))
            .unwrap_or(false);
        if !complete {
            return Err(VyparError::Handler(format!(
                "Product at index {} is missing required fields",
                i
            ))
            .into());
        }
    }
    Ok(())
}

/// Resolve a sales intent to a backend route
pub fn route(intent: &str, data: &Map<String, Value>) -> Result<Route> {
    match intent {
        "create_sale" => {
            validate_sale(data)?;
            Ok(Route::new(
                Method::POST,
                "/sales/buy-product",
                Payload::Json(Value::Object(data.clone())),
            ))
        }
        "generate_invoice" => {
            if !has_value(data, "saleId") || !has_value(data, "recipientEmail") {
                return Err(VyparError::Handler(
                    "saleId and recipientEmail are required for generating an invoice".to_string(),
                )
                .into());
            }
            Ok(Route::new(
                Method::POST,
                "/sales/invoices",
                Payload::Json(Value::Object(data.clone())),
            ))
        }
        other => Err(VyparError::UnknownIntent {
            category: Category::Sales.to_string(),
            intent: other.to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl DomainHandler for SalesHandler {
    fn category(&self) -> Category {
        Category::Sales
    }

    async fn handle(&self, intent: &str, data: &Map<String, Value>, token: &str) -> Result<Value> {
        let route = route(intent, data)?;
        self.backend.send(route, token).await
    }
}

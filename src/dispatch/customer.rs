//! Customer handler: customer records and per-customer bills

use super::backend::{BackendClient, Payload, Route};
use super::{drop_nulls, DomainHandler};
use crate::error::{Result, VyparError};
use crate::intent::{has_value, Category};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Forwards customer intents to the backend
pub struct CustomerHandler {
    backend: Arc<BackendClient>,
}

impl CustomerHandler {
    /// Create a handler over a shared backend client
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

/// Intents that address an existing customer by `customerId`
const ID_INTENTS: [&str; 4] = [
    "update_customer",
    "delete_customer",
    "get_outstanding_bill",
    "get_total_bill",
];

/// Intent actually sent to the backend
///
/// An outstanding-bill request that names a customer but carries no id is
/// answered with the customer lookup instead.
fn effective_intent<'a>(intent: &'a str, data: &Map<String, Value>) -> &'a str {
    if intent == "get_outstanding_bill"
        && has_value(data, "name")
        && !has_value(data, "customerId")
    {
        "get_customer_by_name"
    } else {
        intent
    }
}

/// Customer records inside a lookup reply
///
/// Accepts a bare record, an array of records, or either wrapped in a
/// `data`, `customers` or `customer` key.
fn customer_records(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => {
            for key in ["data", "customers", "customer"] {
                if let Some(inner) = map.get(key) {
                    let records = customer_records(inner);
                    if !records.is_empty() {
                        return records;
                    }
                }
            }
            vec![map]
        }
        _ => Vec::new(),
    }
}

fn customer_id(record: &Map<String, Value>) -> Option<Value> {
    ["customerId", "_id", "id"]
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()).cloned())
}

/// Resolve a customer intent to a backend route
pub fn route(intent: &str, data: &Map<String, Value>) -> Result<Route> {
    let route = match effective_intent(intent, data) {
        "create_customer" => Route::new(
            Method::POST,
            "/customer/customer-register",
            Payload::from_data(data.clone()),
        ),
        "update_customer" => Route::new(
            Method::PUT,
            "/customer/customer-register",
            Payload::from_data(drop_nulls(data)),
        ),
        "delete_customer" => Route::new(
            Method::DELETE,
            "/customer/customer-delete",
            Payload::from_data(data.clone()),
        ),
        "get_outstanding_bill" => Route::new(
            Method::GET,
            "/customer/customer-outstanding",
            Payload::from_data(data.clone()),
        ),
        "get_total_bill" => Route::new(
            Method::GET,
            "/customer/customer-totalBill",
            Payload::from_data(data.clone()),
        ),
        "get_customer_by_name" | "get_customer_details" => {
            let name = data.get("name").filter(|v| !v.is_null()).ok_or_else(|| {
                VyparError::Handler("Name is required for getting customer details".to_string())
            })?;
            let mut body = Map::new();
            body.insert("name".to_string(), name.clone());
            Route::new(Method::POST, "/dealer/get-by-name", Payload::Json(Value::Object(body)))
        }
        other => {
            return Err(VyparError::UnknownIntent {
                category: Category::Customer.to_string(),
                intent: other.to_string(),
            }
            .into())
        }
    };
    Ok(route)
}

#[async_trait]
impl DomainHandler for CustomerHandler {
    fn category(&self) -> Category {
        Category::Customer
    }

    async fn handle(&self, intent: &str, data: &Map<String, Value>, token: &str) -> Result<Value> {
        let effective = effective_intent(intent, data);
        if effective != intent {
            tracing::debug!("Rewriting {} to {}", intent, effective);
        }

        if ID_INTENTS.contains(&effective) && !has_value(data, "customerId") {
            let mut data = data.clone();
            self.attach_customer_id(&mut data, token).await;
            let route = route(intent, &data)?;
            return self.backend.send(route, token).await;
        }

        let route = route(intent, data)?;
        self.backend.send(route, token).await
    }
}

impl CustomerHandler {
    /// Look up `customerId` by email, else by name, and add it to `data`
    ///
    /// A failed or empty lookup leaves `data` unchanged; the backend then
    /// decides what to do with the request.
    async fn attach_customer_id(&self, data: &mut Map<String, Value>, token: &str) {
        let found = if let Some(email) = data.get("email").and_then(Value::as_str) {
            self.find_by_email(email, token).await
        } else if let Some(name) = data.get("name").and_then(Value::as_str) {
            self.find_by_name(name, token).await
        } else {
            return;
        };

        match found {
            Ok(Some(id)) => {
                tracing::debug!("Resolved customerId {}", id);
                data.insert("customerId".to_string(), id);
            }
            Ok(None) => tracing::warn!("No customer matched; forwarding without customerId"),
            Err(e) => tracing::warn!("Customer lookup failed, forwarding without customerId: {}", e),
        }
    }

    async fn find_by_name(&self, name: &str, token: &str) -> Result<Option<Value>> {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(name.to_string()));
        let reply = self
            .backend
            .send(
                Route::new(Method::POST, "/dealer/get-by-name", Payload::Json(Value::Object(body))),
                token,
            )
            .await?;
        Ok(customer_records(&reply).into_iter().find_map(customer_id))
    }

    async fn find_by_email(&self, email: &str, token: &str) -> Result<Option<Value>> {
        let reply = self
            .backend
            .send(
                Route::new(Method::GET, "/dealer/get-all-customer", Payload::Empty),
                token,
            )
            .await?;
        Ok(customer_records(&reply)
            .into_iter()
            .filter(|record| {
                record
                    .get("email")
                    .and_then(Value::as_str)
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .find_map(customer_id))
    }
}

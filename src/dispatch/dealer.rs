//! Dealer handler: dealer-wide reports
//!
//! The backend resolves the dealer from the bearer token, so no request
//! data is forwarded.

use super::backend::{BackendClient, Payload, Route};
use super::DomainHandler;
use crate::error::{Result, VyparError};
use crate::intent::Category;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Forwards dealer report intents to the backend
pub struct DealerHandler {
    backend: Arc<BackendClient>,
}

impl DealerHandler {
    /// Create a handler over a shared backend client
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

/// Resolve a dealer intent to a backend route
pub fn route(intent: &str) -> Result<Route> {
    let path = match intent {
        "get_outstanding_bill" => "/dealer/outstanding-bill",
        "get_total_bill" => "/dealer/total-bill",
        "get_pending_balance" => "/dealer/pending-balance",
        "get_all_customer" => "/dealer/get-all-customer",
        "get_weekly_sale" => "/dealer/weekly-sale",
        "get_monthly_sale" => "/dealer/monthly-sale",
        "get_value_sale" => "/dealer/value-sale",
        other => {
            return Err(VyparError::UnknownIntent {
                category: Category::Dealer.to_string(),
                intent: other.to_string(),
            }
            .into())
        }
    };
    Ok(Route::new(Method::GET, path, Payload::Empty))
}

#[async_trait]
impl DomainHandler for DealerHandler {
    fn category(&self) -> Category {
        Category::Dealer
    }

    async fn handle(&self, intent: &str, _data: &Map<String, Value>, token: &str) -> Result<Value> {
        let route = route(intent)?;
        self.backend.send(route, token).await
    }
}

//! Product handler: product catalogue

use super::backend::{BackendClient, Payload, Route};
use super::{drop_nulls, DomainHandler};
use crate::error::{Result, VyparError};
use crate::intent::Category;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Forwards product intents to the backend
pub struct ProductHandler {
    backend: Arc<BackendClient>,
}

impl ProductHandler {
    /// Create a handler over a shared backend client
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

/// Resolve a product intent to a backend route
pub fn route(intent: &str, data: &Map<String, Value>) -> Result<Route> {
    let route = match intent {
        "create_product" => Route::new(
            Method::POST,
            "/product/create-product",
            Payload::from_data(data.clone()),
        ),
        "update_product" => Route::new(
            Method::PUT,
            "/product/update-product",
            Payload::from_data(drop_nulls(data)),
        ),
        "delete_product" => Route::new(
            Method::DELETE,
            "/product/delete-product",
            Payload::from_data(data.clone()),
        ),
        "get_product_by_name" => {
            let name = match data.get("name") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => {
                    return Err(VyparError::Handler(
                        "Product name is required".to_string(),
                    )
                    .into())
                }
                Some(other) => other.to_string(),
            };
            Route::new(
                Method::GET,
                "/product/get-by-name",
                Payload::Query(vec![("productName".to_string(), name)]),
            )
        }
        "get_all_products" => Route::new(Method::GET, "/product/get-all-products", Payload::Empty),
        other => {
            return Err(VyparError::UnknownIntent {
                category: Category::Product.to_string(),
                intent: other.to_string(),
            }
            .into())
        }
    };
    Ok(route)
}

#[async_trait]
impl DomainHandler for ProductHandler {
    fn category(&self) -> Category {
        Category::Product
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
    fn test_get_by_name_uses_product_name_query() {
        let data = json!({"name": "Widget"});
        let r = route("get_product_by_name", data.as_object().unwrap()).unwrap();
        assert_eq!(r.method, Method::GET);
        assert_eq!(
            r.payload,
            Payload::Query(vec![("productName".to_string(), "Widget".to_string())])
        );
    }

    #[test]
    fn test_get_all_products_has_no_body() {
        let r = route("get_all_products", &Map::new()).unwrap();
        assert_eq!(r.payload, Payload::Empty);
    }

    #[test]
    fn test_update_drops_nulls() {
        let data = json!({"productId": "p1", "rate": null, "gstRate": 18});
        let r = route("update_product", data.as_object().unwrap()).unwrap();
        assert_eq!(r.payload, Payload::Json(json!({"productId": "p1", "gstRate": 18})));
    }

    #[test]
    fn test_unknown_intent() {
        let err = route("restock", &Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid product intent: restock");
    }
}

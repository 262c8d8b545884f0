//! HTTP client for the backend system of record

use crate::config::BackendConfig;
use crate::error::{Result, VyparError};

use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::time::Duration;

/// Request body shape for a backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body
    Empty,
    /// JSON body
    Json(Value),
    /// URL query parameters
    Query(Vec<(String, String)>),
}

impl Payload {
    /// JSON body from a field map; an empty map sends no body
    pub fn from_data(data: Map<String, Value>) -> Self {
        if data.is_empty() {
            Self::Empty
        } else {
            Self::Json(Value::Object(data))
        }
    }
}

/// A resolved backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Path relative to the configured API base
    pub path: &'static str,
    /// What to send
    pub payload: Payload,
}

impl Route {
    /// Build a route
    pub fn new(method: Method, path: &'static str, payload: Payload) -> Self {
        Self {
            method,
            path,
            payload,
        }
    }
}

/// Thin reqwest wrapper shared by the domain handlers
///
/// Every call carries the caller's bearer token and the configured timeout.
/// Non-success statuses become `VyparError::Backend`; nothing is retried.
pub struct BackendClient {
    client: Client,
    api_base: String,
}

impl BackendClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("vypar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VyparError::Config(format!("Failed to create backend client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL every route is joined onto
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Execute a route and return the decoded response body
    ///
    /// Empty bodies decode to `{}`; non-JSON bodies are returned as a string.
    pub async fn send(&self, route: Route, token: &str) -> Result<Value> {
        let url = format!("{}{}", self.api_base, route.path);
        tracing::info!("Backend call: {} {}", route.method, url);

        let mut request = self
            .client
            .request(route.method.clone(), &url)
            .bearer_auth(token);
        request = match &route.payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::Query(params) => request.query(params),
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!("Backend request to {} failed: {}", url, e);
            VyparError::Handler(format!("API request failed: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::error!("Reading backend response from {} failed: {}", url, e);
            VyparError::Handler(format!("Failed to read API response: {}", e))
        })?;
        tracing::debug!("Backend answered {} ({} bytes)", status, text.len());

        if !status.is_success() {
            tracing::error!("Backend returned {} for {}: {}", status, url, text);
            return Err(VyparError::Backend {
                status: status.as_u16(),
                message: text,
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&BackendConfig {
            api_base: format!("{}/api/v1/", server.uri()),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_api_base_trims_trailing_slash() {
        let client = BackendClient::new(&BackendConfig {
            api_base: "http://localhost:5000/api/v1/".to_string(),
            timeout_seconds: 10,
        })
        .unwrap();
        assert_eq!(client.api_base(), "http://localhost:5000/api/v1");
    }

    #[test]
    fn test_payload_from_empty_data_is_empty() {
        assert_eq!(Payload::from_data(Map::new()), Payload::Empty);
    }

    #[tokio::test]
    async fn test_send_json_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/customer/customer-register"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"name": "Bob"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let route = Route::new(
            Method::POST,
            "/customer/customer-register",
            Payload::Json(json!({"name": "Bob"})),
        );
        let result = client.send(route, "tok").await.unwrap();
        assert_eq!(result["id"], "c-1");
    }

    #[tokio::test]
    async fn test_send_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/product/get-by-name"))
            .and(query_param("productName", "Widget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 10})))
            .mount(&server)
            .await;

        let route = Route::new(
            Method::GET,
            "/product/get-by-name",
            Payload::Query(vec![("productName".to_string(), "Widget".to_string())]),
        );
        let result = client_for(&server).send(route, "tok").await.unwrap();
        assert_eq!(result["rate"], 10);
    }

    #[tokio::test]
    async fn test_non_success_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Customer not found"))
            .mount(&server)
            .await;

        let route = Route::new(Method::GET, "/customer/customer-totalBill", Payload::Empty);
        let err = client_for(&server).send(route, "tok").await.unwrap_err();
        match err.downcast_ref::<VyparError>() {
            Some(VyparError::Backend { status, message }) => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Customer not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_and_text_bodies() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v1/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(path("/api/v1/text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let empty = client
            .send(Route::new(Method::DELETE, "/empty", Payload::Empty), "t")
            .await
            .unwrap();
        assert_eq!(empty, json!({}));
        let text = client
            .send(Route::new(Method::GET, "/text", Payload::Empty), "t")
            .await
            .unwrap();
        assert_eq!(text, json!("done"));
    }

    #[tokio::test]
    async fn test_truncated_body_is_handler_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"par",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let client = BackendClient::new(&BackendConfig {
            api_base: format!("http://{}", addr),
            timeout_seconds: 5,
        })
        .unwrap();
        let err = client
            .send(Route::new(Method::GET, "/dealer/total-bill", Payload::Empty), "t")
            .await
            .unwrap_err();
        match err.downcast_ref::<VyparError>() {
            Some(VyparError::Handler(message)) => {
                assert!(message.starts_with("Failed to read API response"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

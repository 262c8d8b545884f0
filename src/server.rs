//! HTTP surface
//!
//! `POST /process-query` runs one dialogue turn; `GET /health` is a liveness
//! probe. Failures are rendered as `{"detail": message}` with the status code
//! mapped from the error taxonomy.

use crate::auth::{bearer_token, user_id_from_token};
use crate::dialogue::{SlotFillingEngine, TurnRequest};
use crate::error::status_code_of;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    engine: Arc<SlotFillingEngine>,
}

/// Uniform error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(err: &anyhow::Error) -> ApiError {
    let status =
        StatusCode::from_u16(status_code_of(err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            detail: err.to_string(),
        }),
    )
}

/// Build the router around an engine
pub fn router(engine: Arc<SlotFillingEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/process-query", post(process_query))
        .with_state(AppState { engine })
}

/// Bind `addr` and serve until the process is stopped
///
/// # Errors
///
/// Returns error if the listener cannot be bound or the server fails
pub async fn run_server(engine: Arc<SlotFillingEngine>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Vypar listening on http://{}", addr);
    axum::serve(listener, app)
        .await
        .context("Server terminated with error")
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// The body is decoded after the credential check so unauthenticated calls
// always get a 401.
async fn process_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(authorization).map_err(|e| {
        tracing::warn!("Rejected request: {}", e);
        api_error(&e)
    })?;

    let request: TurnRequest = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                detail: format!("Invalid request body: {}", e),
            }),
        )
    })?;
    let user_id = user_id_from_token(&token);

    let response = state
        .engine
        .process(request, &token, user_id.as_deref())
        .await
        .map_err(|e| api_error(&e))?;

    Ok(Json(response.to_value()))
}

/*!
Command handlers for the CLI

- `serve`: Run the HTTP API
- `ask`: Process one query locally and print the response
- `history`: Inspect stored conversations

The handlers share `build_engine`, which wires the provider, classifier,
conversation store and dispatcher from configuration.
*/

use crate::config::Config;
use crate::dialogue::SlotFillingEngine;
use crate::dispatch::{BackendClient, IntentDispatcher};
use crate::error::Result;
use crate::intent::LlmClassifier;
use crate::providers::create_provider;
use crate::storage::SqliteStorage;
use std::sync::Arc;

pub mod history;

/// Assemble the dialogue engine described by `config`
///
/// # Errors
///
/// Returns error if the provider, backend client or store cannot be created
pub fn build_engine(config: &Config) -> Result<SlotFillingEngine> {
    let provider = create_provider(&config.provider)?;
    let classifier = LlmClassifier::new(Arc::from(provider));
    let storage = SqliteStorage::from_config(&config.storage)?;
    let backend = BackendClient::new(&config.backend)?;

    tracing::info!(
        "Engine ready: provider={}, backend={}, history_window={}",
        classifier.provider_name(),
        backend.api_base(),
        config.dialogue.history_window
    );

    Ok(SlotFillingEngine::new(
        Arc::new(storage),
        Arc::new(classifier),
        Arc::new(IntentDispatcher::with_backend(Arc::new(backend))),
        config.dialogue.clone(),
    ))
}

// HTTP server command handler
pub mod serve {
    //! Runs the axum server until the process is stopped.

    use super::*;
    use crate::error::VyparError;
    use std::net::SocketAddr;

    /// Start the HTTP server on `config.server.bind`
    pub async fn run_serve(config: Config) -> Result<()> {
        let addr: SocketAddr = config
            .server
            .bind
            .parse()
            .map_err(|e| VyparError::Config(format!("Invalid bind address: {}", e)))?;
        let engine = Arc::new(build_engine(&config)?);
        crate::server::run_server(engine, addr).await
    }
}

// One-shot query command handler
pub mod ask {
    //! Runs a single dialogue turn against the configured backend and prints
    //! the response body.

    use super::*;
    use crate::auth::user_id_from_token;
    use crate::dialogue::TurnRequest;
    use crate::error::VyparError;
    use serde_json::{Map, Value};

    /// Parse the `--data` argument
    ///
    /// # Errors
    ///
    /// Returns a config error unless `raw` is a JSON object
    pub fn parse_data(raw: &str) -> Result<Map<String, Value>> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(VyparError::Config("--data must be a JSON object".to_string()).into()),
            Err(e) => Err(VyparError::Config(format!("--data is not valid JSON: {}", e)).into()),
        }
    }

    /// Process `query` and print the response as pretty JSON
    pub async fn run_ask(
        config: Config,
        query: String,
        token: String,
        conversation_id: Option<String>,
        data: Option<String>,
    ) -> Result<()> {
        let mut request = TurnRequest::new(query);
        request.conversation_id = conversation_id;
        request.additional_data = data.as_deref().map(parse_data).transpose()?;

        let engine = build_engine(&config)?;
        let user_id = user_id_from_token(&token);
        let response = engine.process(request, &token, user_id.as_deref()).await?;

        println!("{}", serde_json::to_string_pretty(&response.to_value())?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_data_object() {
            let map = parse_data(r#"{"email": "a@b.com"}"#).unwrap();
            assert_eq!(map["email"], "a@b.com");
        }

        #[test]
        fn test_parse_data_rejects_non_objects() {
            assert!(parse_data("[1, 2]").is_err());
            assert!(parse_data("email=a@b.com").is_err());
        }
    }
}

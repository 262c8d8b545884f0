//! Vypar - natural-language front end for business operations
//!
//! This library turns free-text requests into structured calls against a
//! backend API, collecting missing fields over several conversation turns.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `intent`: intent envelope, field requirement table and classifier
//! - `dialogue`: the slot-filling engine and its history heuristics
//! - `dispatch`: routing of complete intents to the domain handlers
//! - `storage`: append-only conversation log (SQLite)
//! - `providers`: LLM provider abstraction and implementations (Groq, Ollama)
//! - `auth`: bearer token handling
//! - `server`: HTTP surface
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use vypar::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let engine = vypar::commands::build_engine(&config)?;
//!     let response = engine
//!         .process(vypar::TurnRequest::new("Create a customer"), "token", None)
//!         .await?;
//!     println!("{}", response.to_value());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dialogue;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use dialogue::{SlotFillingEngine, TurnRequest, TurnResponse};
pub use dispatch::IntentDispatcher;
pub use error::{Result, VyparError};
pub use intent::{Category, IntentEnvelope};

#[cfg(test)]
pub mod test_utils;

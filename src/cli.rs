//! Command-line interface definition for Vypar
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the HTTP API, running a single query
//! locally, and inspecting stored conversations.

use clap::{Parser, Subcommand};

/// Vypar - natural-language front end for business operations
///
/// Classifies free-text requests, collects missing fields over several
/// turns and dispatches completed requests to the backend API.
#[derive(Parser, Debug, Clone)]
#[command(name = "vypar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the conversation database path
    #[arg(long, env = "VYPAR_DB_PATH")]
    pub db_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Vypar
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Process a single query locally and print the response
    Ask {
        /// The natural-language request
        query: String,

        /// Bearer token forwarded to the backend
        #[arg(short, long, env = "VYPAR_TOKEN")]
        token: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation_id: Option<String>,

        /// Extra field values as a JSON object
        #[arg(long)]
        data: Option<String>,
    },

    /// Inspect stored conversations
    History {
        /// Show the turns of one conversation instead of the list
        #[arg(long)]
        conversation_id: Option<String>,

        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            db_path: None,
            command: Commands::History {
                conversation_id: None,
                limit: 20,
            },
        }
    }
}

//! Vypar - natural-language front end for business operations
//!
#![doc = "Vypar - natural-language front end for business operations"]
#![doc = "Main entry point for the Vypar server and CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vypar::cli::{Cli, Commands};
use vypar::commands;
use vypar::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    let json_logs = matches!(cli.command, Commands::Serve { json_logs: true, .. });
    init_tracing(json_logs, cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting HTTP server on {}", config.server.bind);
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Ask {
            query,
            token,
            conversation_id,
            data,
        } => {
            if let Some(id) = &conversation_id {
                tracing::debug!("Continuing conversation: {}", id);
            }
            commands::ask::run_ask(config, query, token, conversation_id, data).await?;
            Ok(())
        }
        Commands::History {
            conversation_id,
            limit,
        } => {
            commands::history::handle_history(&config, conversation_id, limit)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber; logs go to stderr so `ask` output stays clean
fn init_tracing(json: bool, verbose: bool) {
    let default_filter = if verbose { "vypar=debug" } else { "vypar=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stepwise - progression and context synthesis for tutoring chats.
//!
//! This is the operator binary. Each subcommand drives one engine operation
//! against the configured database and prints the result as JSON.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use stepwise_config::StepwiseConfig;
use stepwise_core::StepwiseError;
use tracing::info;

/// Stepwise - progression and context synthesis for tutoring chats.
#[derive(Parser, Debug)]
#[command(name = "stepwise", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration and print a summary.
    CheckConfig,
    /// Create the database and apply pending migrations.
    Migrate,
    /// Regenerate a chat's notes if it sits on a milestone.
    Notes { chat_id: String },
    /// Print the aggregated notes of a room.
    Context {
        room_id: String,
        /// Leave this chat's notes out of the aggregate.
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Compute a readiness recommendation for a chat.
    Recommend { chat_id: String },
    /// Evaluate the suggestion gate once for a chat and mode.
    Gate { chat_id: String, mode: String },
    /// Run the full post-reply flow for an assistant message.
    Turn { chat_id: String, message_id: String },
    /// Record the learner accepting or dismissing a suggestion.
    Respond {
        chat_id: String,
        /// `accepted` or `dismissed`.
        response: String,
        #[arg(long)]
        message_id: Option<String>,
    },
    /// List a chat's suggestion events.
    Events { chat_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => stepwise_config::load_and_validate_path(path),
        None => stepwise_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            stepwise_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.general.log_level);
    stepwise_progress::metrics::register_metrics();

    match run(cli.command, &config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: &StepwiseConfig) -> Result<Value, StepwiseError> {
    info!(command = ?command, "running command");
    match command {
        Commands::CheckConfig => Ok(commands::config_summary(config)),
        Commands::Migrate => commands::migrate(config).await,
        Commands::Notes { chat_id } => commands::notes(config, &chat_id).await,
        Commands::Context { room_id, exclude } => {
            commands::context(config, &room_id, exclude.as_deref()).await
        }
        Commands::Recommend { chat_id } => commands::recommend(config, &chat_id).await,
        Commands::Gate { chat_id, mode } => commands::gate(config, &chat_id, &mode).await,
        Commands::Turn {
            chat_id,
            message_id,
        } => commands::turn(config, &chat_id, &message_id).await,
        Commands::Respond {
            chat_id,
            response,
            message_id,
        } => commands::respond(config, &chat_id, &response, message_id.as_deref()).await,
        Commands::Events { chat_id } => commands::events(config, &chat_id).await,
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stepwise={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

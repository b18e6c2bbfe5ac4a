//! crewgen CLI - generate multi-agent crew configurations from a topic.
//!
//! Provides the `crewgen` command: start a generation session and follow its
//! progress, browse the provider catalog, or preview the offline
//! configuration for a topic.

mod commands;

use clap::{Parser, Subcommand};
use commands::{generate, preview, providers};
use crewgen_core::CrewgenConfig;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// crewgen - crew configuration generator
#[derive(Parser, Debug)]
#[command(
    name = "crewgen",
    author,
    version,
    about = "Generate agent and task configurations for a multi-agent crew"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a crew project for a topic
    ///
    /// Starts a generation session, prints each milestone as it is reached
    /// and finally the path of the packaged project.
    Generate {
        /// What the crew should work on
        topic: String,

        /// Provider to use (gemini, openai, anthropic)
        #[arg(long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Directory receiving the session output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the final status as JSON
        #[arg(long)]
        json: bool,
    },

    /// List providers, or the models of one provider
    Providers {
        /// Provider identifier
        provider: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the offline configuration for a topic
    ///
    /// No model is called; the output is what a session falls back to.
    Preview {
        /// What the crew should work on
        topic: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    match args.command {
        Command::Generate { topic, provider, model, output, json } => {
            let config = CrewgenConfig::discover_and_load()?;
            let options = generate::GenerateOptions { topic, provider, model, output, json };
            generate::execute(options, config).await
        }
        Command::Providers { provider, json } => providers::execute(provider.as_deref(), json),
        Command::Preview { topic } => preview::execute(&topic),
    }
}

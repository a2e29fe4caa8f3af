//! Mellivora CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config and generate an inbound API key
//! - `gateway` — Start the honeypot HTTP server
//! - `status`  — Show configuration status
//! - `doctor`  — Diagnose configuration health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mellivora",
    about = "Mellivora — conversational honeypot for scam detection and intelligence extraction",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and generate an inbound API key
    Onboard,

    /// Start the honeypot HTTP gateway
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration status
    Status,

    /// Diagnose configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

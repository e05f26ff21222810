//! Tubechat CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubechat::cli::{commands, Cli, Commands};
use tubechat::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubechat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Chat { url } => {
            commands::run_chat(url, settings).await?;
        }

        Commands::Ask {
            url,
            question,
            top_k,
            model,
        } => {
            commands::run_ask(&url, &question, top_k, model, settings).await?;
        }

        Commands::Transcript { url, output, chunks } => {
            commands::run_transcript(&url, output, chunks, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}

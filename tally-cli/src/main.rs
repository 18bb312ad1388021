mod bootstrap;
mod cli;
mod commands;
mod config;
mod session_store;
mod status_file;

use anyhow::Result;
use clap::Parser;
use crate::cli::{Cli, Commands};
use crate::config::TallyConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = TallyConfig::load()?;
    init_tracing(&config);

    match cli.command {
        Commands::Login { subdomain, token } => commands::login(&config, &subdomain, token).await,
        Commands::Logout => commands::logout(),
        Commands::Status => commands::status(&config).await,
        Commands::Start {
            project,
            task,
            notes,
        } => commands::start(&config, project, task, notes).await,
        Commands::Stop => commands::stop(&config).await,
        Commands::Notes { text } => commands::notes(&config, &text).await,
        Commands::Today => commands::today(&config).await,
        Commands::Tasks { project } => commands::tasks(&config, project).await,
        Commands::Projects => commands::projects(&config).await,
        Commands::Watch => commands::watch(&config).await,
        Commands::ConfigPath => commands::config_path(),
    }
}

/// Log to stderr; RUST_LOG wins over the configured level.
fn init_tracing(config: &TallyConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

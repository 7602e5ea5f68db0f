use anyhow::Result;
use clap::Parser;
use sousbot::cli::{Cli, Commands, resolve_mode};
use sousbot::{Config, assistant, gateway};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let mut config = Config::load_or_init()?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Assist {
            mode,
            interval,
            message,
        } => {
            let mode = resolve_mode(mode);
            assistant::run_assist(&config, mode, interval, message).await?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            gateway::run_gateway(&host, port, &config).await?;
        }
    }

    Ok(())
}

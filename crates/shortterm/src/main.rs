//! `ShortTerm` - temporary email from the terminal.

mod cli;
mod notify;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortterm=info,shortterm_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();
    let config = cli.resolve_config()?;
    info!(api = %config.api_base_url, "Starting ShortTerm");

    cli::run(cli.command, &config).await
}

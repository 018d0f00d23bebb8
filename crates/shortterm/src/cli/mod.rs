//! Command line interface.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shortterm_core::Config;

pub use output::terminal_safe;

#[derive(Debug, Parser)]
#[command(name = "shortterm")]
#[command(version, about = "Temporary email from the terminal", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the temporary email API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Seconds between inbox refreshes
    #[arg(long, global = true)]
    interval: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new temporary address (replaces the current one)
    Generate,

    /// Print the current address
    Address,

    /// Fetch and list the inbox
    Inbox {
        /// Print messages as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,

        /// Print the escaped HTML list instead of plain text
        #[arg(long)]
        html: bool,
    },

    /// Print a message
    Show {
        /// Message id as listed by `inbox`
        id: String,

        /// Print the sanitized HTML instead of plain text
        #[arg(long)]
        html: bool,
    },

    /// Keep refreshing and print new messages as they arrive
    Watch {
        /// Raise a desktop notification for each new message
        #[arg(long)]
        notify: bool,
    },

    /// Delete every message in the inbox
    Clear,

    /// Forget the current address
    Forget,

    /// Show service health and session details
    Status,
}

impl Cli {
    /// Resolves configuration: file, then environment, then flags.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let path = self.config.clone().unwrap_or_else(Config::default_path);
        let mut config = Config::load_file(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        config.apply_env(|key| std::env::var(key).ok())?;

        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(secs) = self.interval {
            config.refresh_interval_secs = secs;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Runs a command to completion.
pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Generate => commands::generate(config).await,
        Command::Address => commands::address(config),
        Command::Inbox { json, html } => commands::inbox(config, json, html).await,
        Command::Show { id, html } => commands::show(config, &id, html).await,
        Command::Watch { notify } => commands::watch(config, notify).await,
        Command::Clear => commands::clear(config).await,
        Command::Forget => commands::forget(config),
        Command::Status => commands::status(config).await,
    }
}

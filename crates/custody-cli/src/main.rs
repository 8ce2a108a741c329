//! Custody CLI
//!
//! One ledger call per invocation against a file-backed state

mod app;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::Cli;
use crate::config::CustodyConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = CustodyConfig::load(cli.config.as_deref())?;
    if let Some(state) = &cli.state {
        config.state_path = state.clone();
    }

    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("Custody v{}", custody_common::VERSION);
    info!(
        state = %config.state_path.display(),
        executor = ?config.executor,
        "Loaded configuration"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run(cli.command, &config.state_path, config.executor, &mut out)
}

//! Custody CLI configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default state file location
pub const DEFAULT_STATE_PATH: &str = "custody-state.json";

/// Default log filter directive
pub const DEFAULT_LOG_FILTER: &str = "info";

/// How the CLI carries out executed actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorMode {
    /// Log the transfer and report success
    Log,
    /// Report failure for every transfer (rehearse rollbacks)
    Reject,
}

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// Ledger state file
    pub state_path: PathBuf,
    /// `tracing` filter used when RUST_LOG is unset
    pub log_filter: String,
    /// Execution behaviour
    pub executor: ExecutorMode,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            executor: ExecutorMode::Log,
        }
    }
}

impl CustodyConfig {
    /// Load configuration from `.env`, a config file and the environment
    ///
    /// Sources, lowest precedence first: built-in defaults, `custody.toml`
    /// in the working directory (or `path` when given, which must exist),
    /// then `CUSTODY_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("custody").required(false)),
        };

        builder
            .add_source(config::Environment::with_prefix("CUSTODY"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

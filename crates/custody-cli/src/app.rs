//! Command dispatch against a file-backed ledger

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use custody_common::{ActionId, ExecutionOutcome};
use custody_ledger::{
    AuthorizationLedger, Executor, FileStore, KeyValueStore, LoggingExecutor, RecordingExecutor,
};
use serde_json::json;
use tracing::{debug, info};

use crate::commands::Command;
use crate::config::ExecutorMode;

fn executor_for(mode: ExecutorMode) -> Arc<dyn Executor> {
    match mode {
        ExecutorMode::Log => Arc::new(LoggingExecutor),
        ExecutorMode::Reject => Arc::new(RecordingExecutor::failing()),
    }
}

/// Run one command, writing notifications and reports to `out`
pub fn run(
    command: Command,
    state_path: &Path,
    mode: ExecutorMode,
    out: &mut impl Write,
) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(state_path)
            .with_context(|| format!("Failed to open state file {}", state_path.display()))?,
    );
    let executor = executor_for(mode);

    let mut ledger = match &command {
        Command::Init {
            principals,
            threshold,
        } => AuthorizationLedger::new(principals.clone(), *threshold, store, executor)?,
        _ => AuthorizationLedger::open(store, executor)
            .context("No ledger found; run `custody init` first")?,
    };
    debug!(?ledger, "Ledger ready");

    match command {
        Command::Init { .. } => {
            info!(path = %state_path.display(), "Ledger initialized");
        }
        Command::Deposit { sender, amount } => ledger.deposit(sender, amount),
        Command::Submit {
            caller,
            destination,
            amount,
            payload,
        } => {
            let payload = payload.unwrap_or_default().0;
            let id = ledger.submit(caller, destination, amount, payload)?;
            info!(action_id = id, "Action submitted");
        }
        Command::Confirm { caller, id } => ledger.confirm(caller, id)?,
        Command::Revoke { caller, id } => ledger.revoke(caller, id)?,
        Command::Execute { caller, id } => match ledger.execute(caller, id)? {
            ExecutionOutcome::Executed => info!(action_id = id, "Action executed"),
            ExecutionOutcome::Pending => info!(
                action_id = id,
                confirmations = ledger.confirmation_count(id)?,
                required = ledger.threshold(),
                "Quorum not reached; nothing executed"
            ),
        },
        Command::Status { id } => {
            let report = status_report(&ledger, id)?;
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        }
    }

    for record in ledger.drain_events() {
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}

fn action_report(ledger: &AuthorizationLedger, id: ActionId) -> Result<serde_json::Value> {
    let action = ledger.action(id)?;
    Ok(json!({
        "id": id,
        "destination": action.destination,
        "amount": action.amount.to_string(),
        "payload": hex::encode(&action.payload),
        "executed": action.executed,
        "confirmations": ledger.confirmations(id)?,
        "quorum": ledger.is_confirmed(id)?,
    }))
}

fn status_report(ledger: &AuthorizationLedger, id: Option<ActionId>) -> Result<serde_json::Value> {
    if let Some(id) = id {
        return action_report(ledger, id);
    }

    let actions = (0..ledger.action_count())
        .map(|id| action_report(ledger, id))
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "principals": ledger.principals(),
        "threshold": ledger.threshold(),
        "action_count": ledger.action_count(),
        "actions": actions,
    }))
}

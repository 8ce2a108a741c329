//! Outbound execution mechanism
//!
//! Once an action reaches quorum the ledger delegates the actual transfer
//! or call to an [`Executor`]. Its side effects are outside the ledger; only
//! the success flag matters, since a failure rolls the execution back.

use custody_common::PrincipalId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// External perform operation
pub trait Executor: Send + Sync {
    /// Carry out the transfer or call, returning whether it succeeded
    fn perform(&self, destination: &PrincipalId, amount: u128, payload: &[u8]) -> bool;
}

/// A single perform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformCall {
    pub destination: PrincipalId,
    pub amount: u128,
    pub payload: Vec<u8>,
}

/// Records every call; can be switched to report failure
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<PerformCall>>,
    fail: AtomicBool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose every perform reports failure
    pub fn failing() -> Self {
        let executor = Self::default();
        executor.set_fail(true);
        executor
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Calls seen so far, including failed ones
    pub fn calls(&self) -> Vec<PerformCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Executor for RecordingExecutor {
    fn perform(&self, destination: &PrincipalId, amount: u128, payload: &[u8]) -> bool {
        self.calls.lock().push(PerformCall {
            destination: *destination,
            amount,
            payload: payload.to_vec(),
        });
        !self.fail.load(Ordering::SeqCst)
    }
}

/// Logs the transfer and reports success
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

impl Executor for LoggingExecutor {
    fn perform(&self, destination: &PrincipalId, amount: u128, payload: &[u8]) -> bool {
        info!(
            destination = %destination,
            amount = %amount,
            payload_len = payload.len(),
            "Performing transfer"
        );
        true
    }
}

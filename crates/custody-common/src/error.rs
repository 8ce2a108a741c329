//! Error types for Custody
//!
//! Provides a unified error type and the ledger's failure taxonomy

use thiserror::Error;

use crate::types::{action::ActionId, principal::PrincipalId};

/// Result type alias using CustodyError
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Unified error type for Custody operations
#[derive(Debug, Error)]
pub enum CustodyError {
    // Ledger state machine errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // Storage substrate errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CustodyError {
    /// The ledger failure kind, if this error came from the state machine
    pub fn ledger(&self) -> Option<&LedgerError> {
        match self {
            CustodyError::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

/// Failures surfaced by the authorization ledger
///
/// Each variant is a deterministic function of ledger state and call input.
/// A call that returns one of these leaves no partial effects behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigViolation),

    #[error("Caller {caller} is not a committee member")]
    NotAuthorized { caller: PrincipalId },

    #[error("Action {action_id} does not exist")]
    UnknownAction { action_id: ActionId },

    #[error("Action {action_id} already confirmed by {principal}")]
    AlreadyConfirmed {
        action_id: ActionId,
        principal: PrincipalId,
    },

    #[error("Action {action_id} not confirmed by {principal}")]
    NotConfirmed {
        action_id: ActionId,
        principal: PrincipalId,
    },

    #[error("Action {action_id} already executed")]
    AlreadyExecuted { action_id: ActionId },

    #[error("Execution of action {action_id} failed")]
    ExecutionFailed { action_id: ActionId },
}

/// Construction-time roster and threshold violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("Owners required")]
    OwnersRequired,

    #[error("Invalid required number of owners: {required} of {owners}")]
    InvalidRequiredOwners { required: u32, owners: usize },

    #[error("Invalid owner")]
    InvalidOwner,

    #[error("Owner not unique: {owner}")]
    OwnerNotUnique { owner: PrincipalId },
}

// Implement From for common external error types
impl From<ConfigViolation> for CustodyError {
    fn from(err: ConfigViolation) -> Self {
        CustodyError::Ledger(LedgerError::InvalidConfiguration(err))
    }
}

impl From<serde_json::Error> for CustodyError {
    fn from(err: serde_json::Error) -> Self {
        CustodyError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CustodyError {
    fn from(err: bincode::Error) -> Self {
        CustodyError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CustodyError {
    fn from(err: std::io::Error) -> Self {
        CustodyError::Storage(err.to_string())
    }
}

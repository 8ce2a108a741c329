//! # Custody Common
//!
//! Shared types, errors, and ledger notifications for the Custody
//! threshold-authorization ledger.
//!
//! ## Core Types
//!
//! - [`PrincipalId`]: 20-byte identifier for committee members and destinations
//! - [`Action`]: proposed destination/amount/payload awaiting quorum
//! - [`LedgerEvent`]/[`EventRecord`]: notifications emitted by the ledger
//!
//! ## Errors
//!
//! - [`LedgerError`]: the ledger's failure taxonomy
//! - [`ConfigViolation`]: construction-time roster/threshold violations
//! - [`CustodyError`]: unified error wrapping ledger and substrate failures

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigViolation, CustodyError, LedgerError, Result};
pub use types::{
    action::{Action, ActionId, ExecutionOutcome},
    event::{EventRecord, LedgerEvent},
    principal::{PrincipalId, PrincipalParseError, PRINCIPAL_LEN},
};

/// Custody version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Custody Ledger
//!
//! Threshold-authorization state machine: a fixed committee of N principals
//! jointly approves actions, and an action executes once M of them agree.
//!
//! ## Components
//!
//! - **Committee**: immutable roster plus quorum threshold
//! - **Ledger**: submit / confirm / revoke / execute / deposit operations
//! - **Store**: synchronous key-value substrate (in-memory or file-backed)
//! - **Executor**: outbound perform call made at execution time
//! - **Events**: ordered notification log and forwarding sinks
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  AuthorizationLedger                     │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────┐  │
//! │  │ Committee  │   │ KeyValueStore│   │   EventLog /   │  │
//! │  │ (roster,M) │───│ (actions,    │───│   EventSink    │  │
//! │  │            │   │  approvals)  │   │                │  │
//! │  └────────────┘   └──────┬───────┘   └────────────────┘  │
//! │                          │ executed=true, then perform   │
//! │                   ┌──────┴───────┐                       │
//! │                   │   Executor   │                       │
//! │                   └──────────────┘                       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod committee;
pub mod events;
pub mod executor;
pub mod ledger;
pub mod shared;
pub mod store;

pub use committee::{Committee, CommitteeRecord};
pub use events::{ChannelSink, EventLog, EventSink};
pub use executor::{Executor, LoggingExecutor, PerformCall, RecordingExecutor};
pub use ledger::AuthorizationLedger;
pub use shared::SharedLedger;
pub use store::{FileStore, InMemoryStore, KeyValueStore};

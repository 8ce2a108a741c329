//! Ledger notifications
//!
//! Every call that succeeds emits exactly one notification, except silent
//! execute no-ops and read-only queries which emit none.

use serde::{Deserialize, Serialize};

use super::action::ActionId;
use super::principal::PrincipalId;

/// Notification emitted by the authorization ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    /// Value arrived at the ledger's holding address
    Deposit { sender: PrincipalId, amount: u128 },

    /// A member proposed a new action
    Submission {
        caller: PrincipalId,
        action_id: ActionId,
        destination: PrincipalId,
        amount: u128,
        #[serde(with = "hex")]
        payload: Vec<u8>,
    },

    /// A member approved an action
    Confirmation {
        caller: PrincipalId,
        action_id: ActionId,
    },

    /// A member withdrew an earlier approval
    Revocation {
        caller: PrincipalId,
        action_id: ActionId,
    },

    /// An action reached quorum and was performed
    Execution {
        caller: PrincipalId,
        action_id: ActionId,
    },
}

impl LedgerEvent {
    /// Stable event type name
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::Deposit { .. } => "Deposit",
            LedgerEvent::Submission { .. } => "Submission",
            LedgerEvent::Confirmation { .. } => "Confirmation",
            LedgerEvent::Revocation { .. } => "Revocation",
            LedgerEvent::Execution { .. } => "Execution",
        }
    }

    /// Action the event refers to (deposits refer to none)
    pub fn action_id(&self) -> Option<ActionId> {
        match self {
            LedgerEvent::Deposit { .. } => None,
            LedgerEvent::Submission { action_id, .. }
            | LedgerEvent::Confirmation { action_id, .. }
            | LedgerEvent::Revocation { action_id, .. }
            | LedgerEvent::Execution { action_id, .. } => Some(*action_id),
        }
    }
}

/// Envelope pairing a notification with its log position and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the emitting ledger's log, starting at 0
    pub sequence: u64,

    /// Emission time (Unix milliseconds)
    pub timestamp: i64,

    pub event: LedgerEvent,
}

impl EventRecord {
    pub fn new(sequence: u64, event: LedgerEvent) -> Self {
        Self {
            sequence,
            timestamp: chrono::Utc::now().timestamp_millis(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_and_action() {
        let deposit = LedgerEvent::Deposit {
            sender: PrincipalId::from_low_u64(1),
            amount: 10,
        };
        assert_eq!(deposit.kind(), "Deposit");
        assert_eq!(deposit.action_id(), None);

        let exec = LedgerEvent::Execution {
            caller: PrincipalId::from_low_u64(1),
            action_id: 4,
        };
        assert_eq!(exec.kind(), "Execution");
        assert_eq!(exec.action_id(), Some(4));
    }

    #[test]
    fn test_event_json_shape() {
        let event = LedgerEvent::Confirmation {
            caller: PrincipalId::from_low_u64(2),
            action_id: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Confirmation");
        assert_eq!(json["data"]["action_id"], 0);
        assert_eq!(json["data"]["caller"], PrincipalId::from_low_u64(2).to_string());
    }
}

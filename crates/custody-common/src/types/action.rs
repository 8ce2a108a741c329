//! Action - a proposed transfer or call awaiting quorum
//!
//! Actions are created once at submission and never deleted. The only
//! mutation is the one-way `executed` flip performed by the execution step.

use serde::{Deserialize, Serialize};

use super::principal::PrincipalId;

/// Sequence number assigned at submission (dense, starting at 0)
pub type ActionId = u64;

/// A proposed destination/amount/payload triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Recipient of the transfer or target of the call
    pub destination: PrincipalId,

    /// Value to transfer
    pub amount: u128,

    /// Opaque call data, possibly empty
    #[serde(with = "hex")]
    pub payload: Vec<u8>,

    /// Set once quorum was reached and perform succeeded
    pub executed: bool,
}

impl Action {
    /// Create an unexecuted action
    pub fn new(destination: PrincipalId, amount: u128, payload: Vec<u8>) -> Self {
        Self {
            destination,
            amount,
            payload,
            executed: false,
        }
    }

    /// BLAKE3 digest over destination, amount and payload
    ///
    /// Stable across executions: the executed flag is not hashed.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.destination.as_bytes());
        hasher.update(&self.amount.to_le_bytes());
        hasher.update(&(self.payload.len() as u64).to_le_bytes());
        hasher.update(&self.payload);
        *hasher.finalize().as_bytes()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Action(to={}, amount={}, payload={}B, executed={})",
            self.destination,
            self.amount,
            self.payload.len(),
            self.executed
        )
    }
}

/// Result of a successful execute call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Quorum held; the action is now executed and perform succeeded
    Executed,
    /// Quorum did not hold; nothing changed
    Pending,
}

impl ExecutionOutcome {
    #[inline]
    pub fn is_executed(&self) -> bool {
        matches!(self, ExecutionOutcome::Executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_action_unexecuted() {
        let action = Action::new(PrincipalId::from_low_u64(9), 100, Vec::new());
        assert!(!action.executed);
        assert!(action.payload.is_empty());
    }

    #[test]
    fn test_digest_ignores_executed_flag() {
        let mut action = Action::new(PrincipalId::from_low_u64(9), 100, vec![1, 2, 3]);
        let before = action.digest();
        action.executed = true;
        assert_eq!(action.digest(), before);

        let other = Action::new(PrincipalId::from_low_u64(9), 101, vec![1, 2, 3]);
        assert_ne!(other.digest(), before);
    }

    #[test]
    fn test_payload_serializes_as_hex() {
        let action = Action::new(PrincipalId::from_low_u64(1), 5, vec![0xde, 0xad]);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["payload"], "dead");
        assert_eq!(json["executed"], false);
    }

    #[test]
    fn test_bincode_preserves_action() {
        let action = Action::new(PrincipalId::from_low_u64(3), u128::MAX, vec![7; 40]);
        let bytes = bincode::serialize(&action).unwrap();
        let back: Action = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, action);
    }
}

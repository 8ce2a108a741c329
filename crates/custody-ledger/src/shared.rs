//! Cloneable handle serializing access to one ledger
//!
//! The lock is held for the whole operation, including the executor call
//! made by `execute`, so no two calls ever interleave. Executors must not
//! call back into the same handle.

use std::sync::Arc;

use custody_common::{Action, ActionId, EventRecord, ExecutionOutcome, PrincipalId, Result};
use parking_lot::Mutex;

use crate::ledger::AuthorizationLedger;

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<AuthorizationLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: AuthorizationLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn deposit(&self, sender: PrincipalId, amount: u128) {
        self.inner.lock().deposit(sender, amount)
    }

    pub fn submit(
        &self,
        caller: PrincipalId,
        destination: PrincipalId,
        amount: u128,
        payload: Vec<u8>,
    ) -> Result<ActionId> {
        self.inner.lock().submit(caller, destination, amount, payload)
    }

    pub fn confirm(&self, caller: PrincipalId, action_id: ActionId) -> Result<()> {
        self.inner.lock().confirm(caller, action_id)
    }

    pub fn revoke(&self, caller: PrincipalId, action_id: ActionId) -> Result<()> {
        self.inner.lock().revoke(caller, action_id)
    }

    pub fn execute(&self, caller: PrincipalId, action_id: ActionId) -> Result<ExecutionOutcome> {
        self.inner.lock().execute(caller, action_id)
    }

    pub fn is_confirmed(&self, action_id: ActionId) -> Result<bool> {
        self.inner.lock().is_confirmed(action_id)
    }

    pub fn action(&self, action_id: ActionId) -> Result<Action> {
        self.inner.lock().action(action_id)
    }

    pub fn action_count(&self) -> u64 {
        self.inner.lock().action_count()
    }

    /// Copy of the buffered notifications
    pub fn events(&self) -> Vec<EventRecord> {
        self.inner.lock().events().to_vec()
    }

    /// Take the buffered notifications
    pub fn drain_events(&self) -> Vec<EventRecord> {
        self.inner.lock().drain_events()
    }

    /// Run `f` with exclusive access to the ledger
    pub fn with<R>(&self, f: impl FnOnce(&mut AuthorizationLedger) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl std::fmt::Debug for SharedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use crate::store::InMemoryStore;
    use custody_common::LedgerEvent;
    use std::thread;

    #[test]
    fn test_concurrent_execute_performs_once() {
        let executor = Arc::new(RecordingExecutor::new());
        let members: Vec<PrincipalId> = (1..=4).map(PrincipalId::from_low_u64).collect();
        let ledger = AuthorizationLedger::new(
            members.clone(),
            2,
            Arc::new(InMemoryStore::new()),
            executor.clone(),
        )
        .unwrap();
        let shared = SharedLedger::new(ledger);

        let id = shared
            .submit(members[0], PrincipalId::from_low_u64(99), 10, Vec::new())
            .unwrap();
        shared.confirm(members[0], id).unwrap();
        shared.confirm(members[1], id).unwrap();

        let handles: Vec<_> = members
            .iter()
            .map(|member| {
                let shared = shared.clone();
                let member = *member;
                thread::spawn(move || shared.execute(member, id))
            })
            .collect();

        let executed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| matches!(r, Ok(ExecutionOutcome::Executed)))
            .count();

        assert_eq!(executed, 1);
        assert_eq!(executor.call_count(), 1);

        let executions = shared
            .events()
            .iter()
            .filter(|r| matches!(r.event, LedgerEvent::Execution { .. }))
            .count();
        assert_eq!(executions, 1);
    }

    #[test]
    fn test_with_gives_query_access() {
        let ledger = AuthorizationLedger::new(
            vec![PrincipalId::from_low_u64(1)],
            1,
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingExecutor::new()),
        )
        .unwrap();
        let shared = SharedLedger::new(ledger);
        assert_eq!(shared.with(|l| l.threshold()), 1);
        assert_eq!(shared.action_count(), 0);
    }

    #[test]
    fn test_drain_through_any_clone() {
        let ledger = AuthorizationLedger::new(
            vec![PrincipalId::from_low_u64(1)],
            1,
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingExecutor::new()),
        )
        .unwrap();
        let shared = SharedLedger::new(ledger);
        let other = shared.clone();

        shared.deposit(PrincipalId::from_low_u64(7), 3);
        shared.deposit(PrincipalId::from_low_u64(7), 4);

        let drained = other.drain_events();
        assert_eq!(drained.len(), 2);
        assert!(shared.events().is_empty());

        shared.deposit(PrincipalId::from_low_u64(7), 5);
        assert_eq!(other.drain_events()[0].sequence, 2);
    }
}

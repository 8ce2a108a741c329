//! Authorization Ledger
//!
//! Confirmation/execution state machine for committee-approved actions:
//! 1. A member submits an action, which gets the next sequence number
//! 2. Members confirm or revoke their approval
//! 3. Any member may request execution; it happens once quorum holds
//! 4. Execution commits `executed = true`, then delegates to the executor
//!
//! Every operation checks its preconditions up front, in a fixed order
//! (membership, then existence, then state), and returns the first failure.

use std::sync::Arc;

use custody_common::{
    Action, ActionId, CustodyError, EventRecord, ExecutionOutcome, LedgerError, LedgerEvent,
    PrincipalId, Result,
};
use tracing::{debug, error, info, instrument, warn};

use crate::committee::{Committee, CommitteeRecord};
use crate::events::{EventLog, EventSink};
use crate::executor::Executor;
use crate::store::{self, keys, KeyValueStore};

/// Attempts at restoring an action record after a failed perform
const ROLLBACK_ATTEMPTS: usize = 3;

/// Threshold-authorization ledger
pub struct AuthorizationLedger {
    committee: Committee,
    store: Arc<dyn KeyValueStore>,
    executor: Arc<dyn Executor>,
    log: EventLog,
    sinks: Vec<Box<dyn EventSink>>,
    action_count: u64,
}

impl AuthorizationLedger {
    /// Construct a ledger for `principals` requiring `threshold` confirmations
    ///
    /// The committee is persisted into `store`, which must not already hold
    /// a ledger.
    #[instrument(skip_all, fields(owners = principals.len(), threshold = threshold))]
    pub fn new(
        principals: Vec<PrincipalId>,
        threshold: u32,
        store: Arc<dyn KeyValueStore>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        let committee = Committee::new(principals, threshold).map_err(LedgerError::from)?;

        if store.get(keys::COMMITTEE)?.is_some() {
            return Err(CustodyError::Storage("ledger already initialized".to_string()));
        }

        store::save(&*store, keys::COMMITTEE, &committee.to_record())?;
        store::save(&*store, keys::ACTION_COUNT, &0u64)?;

        info!(
            owners = committee.len(),
            threshold = committee.threshold(),
            "Authorization ledger created"
        );

        Ok(Self {
            committee,
            store,
            executor,
            log: EventLog::new(),
            sinks: Vec::new(),
            action_count: 0,
        })
    }

    /// Reopen a ledger previously constructed into `store`
    #[instrument(skip_all)]
    pub fn open(store: Arc<dyn KeyValueStore>, executor: Arc<dyn Executor>) -> Result<Self> {
        let record: CommitteeRecord = store::load(&*store, keys::COMMITTEE)?
            .ok_or_else(|| CustodyError::Storage("ledger not initialized".to_string()))?;
        let committee = Committee::from_record(record).map_err(LedgerError::from)?;
        let action_count: u64 = store::load(&*store, keys::ACTION_COUNT)?.unwrap_or(0);

        info!(
            owners = committee.len(),
            threshold = committee.threshold(),
            actions = action_count,
            "Authorization ledger opened"
        );

        Ok(Self {
            committee,
            store,
            executor,
            log: EventLog::new(),
            sinks: Vec::new(),
            action_count,
        })
    }

    /// Attach an additional notification sink
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    // ============ OPERATIONS ============

    /// Record value arriving at the ledger's holding address
    ///
    /// Anyone may deposit. Nothing but the notification changes.
    pub fn deposit(&mut self, sender: PrincipalId, amount: u128) {
        self.emit(LedgerEvent::Deposit { sender, amount });
    }

    /// Propose a new action, returning its id
    ///
    /// Submission does not confirm; the submitter must confirm separately.
    #[instrument(skip(self, payload), fields(caller = %caller, payload_len = payload.len()))]
    pub fn submit(
        &mut self,
        caller: PrincipalId,
        destination: PrincipalId,
        amount: u128,
        payload: Vec<u8>,
    ) -> Result<ActionId> {
        self.ensure_member(&caller)?;

        let action_id = self.action_count;
        let action = Action::new(destination, amount, payload);

        store::save(&*self.store, &keys::action(action_id), &action)?;
        store::save(&*self.store, keys::ACTION_COUNT, &(action_id + 1))?;
        self.action_count = action_id + 1;

        debug!(
            action_id,
            digest = %hex::encode(action.digest()),
            "Action stored"
        );

        self.emit(LedgerEvent::Submission {
            caller,
            action_id,
            destination,
            amount,
            payload: action.payload,
        });

        Ok(action_id)
    }

    /// Approve an action
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn confirm(&mut self, caller: PrincipalId, action_id: ActionId) -> Result<()> {
        self.ensure_member(&caller)?;
        self.ensure_exists(action_id)?;
        if self.is_confirmed_by(action_id, &caller)? {
            return Err(LedgerError::AlreadyConfirmed {
                action_id,
                principal: caller,
            }
            .into());
        }

        store::save(&*self.store, &keys::confirmation(action_id, &caller), &true)?;

        self.emit(LedgerEvent::Confirmation { caller, action_id });
        Ok(())
    }

    /// Withdraw an earlier approval
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn revoke(&mut self, caller: PrincipalId, action_id: ActionId) -> Result<()> {
        self.ensure_member(&caller)?;
        if !self.is_confirmed_by(action_id, &caller)? {
            return Err(LedgerError::NotConfirmed {
                action_id,
                principal: caller,
            }
            .into());
        }
        if self.load_action(action_id)?.executed {
            return Err(LedgerError::AlreadyExecuted { action_id }.into());
        }

        self.store.delete(&keys::confirmation(action_id, &caller))?;

        self.emit(LedgerEvent::Revocation { caller, action_id });
        Ok(())
    }

    /// Execute an action if quorum currently holds
    ///
    /// Below quorum this succeeds with [`ExecutionOutcome::Pending`] and
    /// changes nothing. At quorum, `executed = true` is written before the
    /// executor runs; if the executor fails the previous record is restored
    /// and [`LedgerError::ExecutionFailed`] is returned.
    ///
    /// The store is not transactional. If every restore attempt fails the
    /// record stays `executed = true`; the call still reports
    /// `ExecutionFailed` and logs the storage error.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn execute(
        &mut self,
        caller: PrincipalId,
        action_id: ActionId,
    ) -> Result<ExecutionOutcome> {
        self.ensure_member(&caller)?;
        let action = self.load_action(action_id)?;
        if action.executed {
            return Err(LedgerError::AlreadyExecuted { action_id }.into());
        }

        if !self.is_confirmed(action_id)? {
            debug!(action_id, "Quorum not reached, execution deferred");
            return Ok(ExecutionOutcome::Pending);
        }

        let key = keys::action(action_id);
        let committed = Action {
            executed: true,
            ..action.clone()
        };
        store::save(&*self.store, &key, &committed)?;

        let succeeded = self.executor.perform(
            &committed.destination,
            committed.amount,
            &committed.payload,
        );

        if !succeeded {
            warn!(action_id, "Perform failed, rolling back execution");
            self.restore(&key, &action);
            return Err(LedgerError::ExecutionFailed { action_id }.into());
        }

        self.emit(LedgerEvent::Execution { caller, action_id });
        Ok(ExecutionOutcome::Executed)
    }

    // ============ QUERIES ============

    /// Whether at least `threshold` members have confirmed `action_id`
    ///
    /// Counts in roster order and stops as soon as the threshold is hit.
    /// Unknown actions have no confirmations and report false.
    pub fn is_confirmed(&self, action_id: ActionId) -> Result<bool> {
        self.committee
            .quorum_reached(|member| self.is_confirmed_by(action_id, member))
    }

    /// Whether `principal` currently confirms `action_id`
    pub fn is_confirmed_by(&self, action_id: ActionId, principal: &PrincipalId) -> Result<bool> {
        let flag: Option<bool> =
            store::load(&*self.store, &keys::confirmation(action_id, principal))?;
        Ok(flag.unwrap_or(false))
    }

    /// Number of members currently confirming `action_id`
    pub fn confirmation_count(&self, action_id: ActionId) -> Result<u32> {
        self.committee
            .count_approvals(|member| self.is_confirmed_by(action_id, member))
    }

    /// Members currently confirming `action_id`, in roster order
    pub fn confirmations(&self, action_id: ActionId) -> Result<Vec<PrincipalId>> {
        let mut confirmed = Vec::new();
        for member in self.committee.members() {
            if self.is_confirmed_by(action_id, member)? {
                confirmed.push(*member);
            }
        }
        Ok(confirmed)
    }

    /// Stored action record
    pub fn action(&self, action_id: ActionId) -> Result<Action> {
        self.load_action(action_id)
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn is_member(&self, principal: &PrincipalId) -> bool {
        self.committee.is_member(principal)
    }

    /// Principals in construction order
    pub fn principals(&self) -> &[PrincipalId] {
        self.committee.members()
    }

    pub fn threshold(&self) -> u32 {
        self.committee.threshold()
    }

    /// Notifications emitted since the last drain
    pub fn events(&self) -> &[EventRecord] {
        self.log.records()
    }

    /// Take the buffered notifications
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        self.log.drain()
    }

    // ============ INTERNALS ============

    fn ensure_member(&self, caller: &PrincipalId) -> Result<()> {
        if !self.committee.is_member(caller) {
            warn!(caller = %caller, "Rejected call from non-member");
            return Err(LedgerError::NotAuthorized { caller: *caller }.into());
        }
        Ok(())
    }

    fn ensure_exists(&self, action_id: ActionId) -> Result<()> {
        if action_id >= self.action_count {
            return Err(LedgerError::UnknownAction { action_id }.into());
        }
        Ok(())
    }

    fn load_action(&self, action_id: ActionId) -> Result<Action> {
        self.ensure_exists(action_id)?;
        store::load(&*self.store, &keys::action(action_id))?.ok_or_else(|| {
            CustodyError::Storage(format!("Missing record for action {}", action_id))
        })
    }

    fn restore(&self, key: &str, action: &Action) {
        for attempt in 1..=ROLLBACK_ATTEMPTS {
            match store::save(&*self.store, key, action) {
                Ok(()) => return,
                Err(e) if attempt < ROLLBACK_ATTEMPTS => {
                    warn!(key, attempt, error = %e, "Rollback write failed, retrying");
                }
                Err(e) => {
                    error!(key, error = %e, "Rollback failed, record left marked executed");
                }
            }
        }
    }

    fn emit(&mut self, event: LedgerEvent) {
        let record = self.log.append(event);

        info!(
            sequence = record.sequence,
            kind = record.event.kind(),
            action_id = ?record.event.action_id(),
            "Ledger event"
        );

        for sink in &mut self.sinks {
            sink.record(&record);
        }
    }
}

impl std::fmt::Debug for AuthorizationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationLedger")
            .field("committee", &self.committee)
            .field("action_count", &self.action_count)
            .field("pending_events", &self.log.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use crate::store::InMemoryStore;

    fn p(n: u64) -> PrincipalId {
        PrincipalId::from_low_u64(n)
    }

    fn ledger(owners: u64, threshold: u32) -> (AuthorizationLedger, Arc<RecordingExecutor>) {
        let executor = Arc::new(RecordingExecutor::new());
        let ledger = AuthorizationLedger::new(
            (1..=owners).map(p).collect(),
            threshold,
            Arc::new(InMemoryStore::new()),
            executor.clone(),
        )
        .unwrap();
        (ledger, executor)
    }

    fn ledger_error(result: Result<impl std::fmt::Debug>) -> LedgerError {
        match result {
            Err(CustodyError::Ledger(err)) => err,
            other => panic!("expected ledger error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_ledger() {
        let (ledger, _) = ledger(3, 2);
        assert_eq!(ledger.threshold(), 2);
        assert_eq!(ledger.principals(), &[p(1), p(2), p(3)]);
        assert_eq!(ledger.action_count(), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_store_cannot_host_two_ledgers() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let executor = Arc::new(RecordingExecutor::new());
        AuthorizationLedger::new(vec![p(1)], 1, store.clone(), executor.clone()).unwrap();

        let second = AuthorizationLedger::new(vec![p(2)], 1, store, executor);
        assert!(matches!(second, Err(CustodyError::Storage(_))));
    }

    #[test]
    fn test_submit_assigns_sequential_ids() {
        let (mut ledger, _) = ledger(2, 1);
        assert_eq!(ledger.submit(p(1), p(9), 10, Vec::new()).unwrap(), 0);
        assert_eq!(ledger.submit(p(2), p(9), 20, vec![1]).unwrap(), 1);
        assert_eq!(ledger.action_count(), 2);

        let action = ledger.action(1).unwrap();
        assert_eq!(action.amount, 20);
        assert_eq!(action.payload, vec![1]);
        assert!(!action.executed);
    }

    #[test]
    fn test_submit_does_not_confirm() {
        let (mut ledger, _) = ledger(2, 1);
        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();
        assert!(!ledger.is_confirmed_by(id, &p(1)).unwrap());
        assert!(!ledger.is_confirmed(id).unwrap());
    }

    #[test]
    fn test_confirm_checks_in_order() {
        let (mut ledger, _) = ledger(2, 1);

        // Non-member on an unknown action reports membership first
        assert!(matches!(
            ledger_error(ledger.confirm(p(7), 5)),
            LedgerError::NotAuthorized { .. }
        ));
        assert_eq!(
            ledger_error(ledger.confirm(p(1), 5)),
            LedgerError::UnknownAction { action_id: 5 }
        );

        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();
        ledger.confirm(p(1), id).unwrap();
        assert_eq!(
            ledger_error(ledger.confirm(p(1), id)),
            LedgerError::AlreadyConfirmed {
                action_id: id,
                principal: p(1)
            }
        );
        assert_eq!(ledger.confirmation_count(id).unwrap(), 1);
    }

    #[test]
    fn test_revoke_checks_in_order() {
        let (mut ledger, _) = ledger(2, 1);
        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();

        assert!(matches!(
            ledger_error(ledger.revoke(p(7), id)),
            LedgerError::NotAuthorized { .. }
        ));
        assert!(matches!(
            ledger_error(ledger.revoke(p(1), id)),
            LedgerError::NotConfirmed { .. }
        ));
        // Unknown ids have no confirmations either
        assert!(matches!(
            ledger_error(ledger.revoke(p(1), 99)),
            LedgerError::NotConfirmed { action_id: 99, .. }
        ));

        ledger.confirm(p(1), id).unwrap();
        ledger.revoke(p(1), id).unwrap();
        assert!(!ledger.is_confirmed_by(id, &p(1)).unwrap());
    }

    #[test]
    fn test_execute_below_quorum_is_noop() {
        let (mut ledger, executor) = ledger(3, 2);
        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();
        ledger.confirm(p(1), id).unwrap();
        let before = ledger.events().len();

        assert_eq!(ledger.execute(p(1), id).unwrap(), ExecutionOutcome::Pending);
        assert!(!ledger.action(id).unwrap().executed);
        assert_eq!(executor.call_count(), 0);
        assert_eq!(ledger.events().len(), before);
    }

    #[test]
    fn test_execute_at_quorum() {
        let (mut ledger, executor) = ledger(3, 2);
        let id = ledger.submit(p(1), p(9), 100, vec![0xab]).unwrap();
        ledger.confirm(p(1), id).unwrap();
        ledger.confirm(p(3), id).unwrap();

        assert_eq!(ledger.execute(p(2), id).unwrap(), ExecutionOutcome::Executed);
        assert!(ledger.action(id).unwrap().executed);

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].destination, p(9));
        assert_eq!(calls[0].amount, 100);
        assert_eq!(calls[0].payload, vec![0xab]);

        assert_eq!(
            ledger_error(ledger.execute(p(1), id)),
            LedgerError::AlreadyExecuted { action_id: id }
        );
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn test_execute_unknown_action() {
        let (mut ledger, _) = ledger(1, 1);
        assert_eq!(
            ledger_error(ledger.execute(p(1), 0)),
            LedgerError::UnknownAction { action_id: 0 }
        );
    }

    #[test]
    fn test_failed_perform_rolls_back() {
        let (mut ledger, executor) = ledger(2, 1);
        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();
        ledger.confirm(p(1), id).unwrap();
        let events_before = ledger.events().len();

        executor.set_fail(true);
        assert_eq!(
            ledger_error(ledger.execute(p(1), id)),
            LedgerError::ExecutionFailed { action_id: id }
        );
        assert!(!ledger.action(id).unwrap().executed);
        assert_eq!(ledger.events().len(), events_before);

        // The caller may simply retry once the executor recovers
        executor.set_fail(false);
        assert!(ledger.execute(p(1), id).unwrap().is_executed());
        assert_eq!(executor.call_count(), 2);
    }

    #[test]
    fn test_confirmations_in_roster_order() {
        let (mut ledger, _) = ledger(4, 2);
        let id = ledger.submit(p(1), p(9), 10, Vec::new()).unwrap();
        ledger.confirm(p(4), id).unwrap();
        ledger.confirm(p(2), id).unwrap();
        assert_eq!(ledger.confirmations(id).unwrap(), vec![p(2), p(4)]);
    }

    #[test]
    fn test_deposit_emits_only_notification() {
        let (mut ledger, _) = ledger(1, 1);
        ledger.deposit(p(42), 500);

        assert_eq!(ledger.action_count(), 0);
        assert_eq!(
            ledger.events()[0].event,
            LedgerEvent::Deposit {
                sender: p(42),
                amount: 500
            }
        );
    }

    #[test]
    fn test_drain_events() {
        let (mut ledger, _) = ledger(1, 1);
        ledger.deposit(p(1), 1);
        ledger.deposit(p(1), 2);

        let drained = ledger.drain_events();
        assert_eq!(drained.len(), 2);
        assert!(ledger.events().is_empty());

        ledger.deposit(p(1), 3);
        assert_eq!(ledger.events()[0].sequence, 2);
    }
}

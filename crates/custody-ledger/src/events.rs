//! Notification delivery
//!
//! The ledger always appends to its own [`EventLog`]; extra sinks can be
//! attached to forward the same records elsewhere.

use custody_common::{EventRecord, LedgerEvent};
use tokio::sync::mpsc;
use tracing::warn;

/// Receives every record the ledger emits, in order
pub trait EventSink: Send {
    fn record(&mut self, record: &EventRecord);
}

/// Ordered append-only in-memory log
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_sequence: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `event` in the next envelope and append it
    pub fn append(&mut self, event: LedgerEvent) -> EventRecord {
        let record = EventRecord::new(self.next_sequence, event);
        self.next_sequence += 1;
        self.records.push(record.clone());
        record
    }

    /// Records not yet drained
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Take the buffered records; sequence numbers keep counting
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Forwards records to an async consumer
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<EventRecord>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving half
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EventRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn record(&mut self, record: &EventRecord) {
        if self.tx.send(record.clone()).is_err() {
            warn!(sequence = record.sequence, "Event receiver dropped");
        }
    }
}

//! The collaborative text document.
//!
//! [`Document`] is the engine facade. The editor talks to it with offsets
//! into the visible text; the transport talks to it with opaque byte
//! payloads. All mutations of one document are serialized by a single lock,
//! and subscribers are notified after the lock is released.

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::DocumentConfig;
use crate::crdt::{
    ChangeEvent, ChangeNotifier, ChangeOrigin, Item, MergeOutcome, Operation, OperationId,
    PendingBuffer, ReplicaClock, ReplicaId, SequenceStore, StateVector, Subscription, apply_remote,
    random_replica_id,
};
use crate::error::{Result, SyncError};
use crate::sync::{Snapshot, Update};

/// A buffered operation that outlived the pending timeout: (operation, missing, waited).
type Overdue = (OperationId, OperationId, chrono::Duration);

struct DocState {
    store: SequenceStore,
    pending: PendingBuffer,
}

/// One replica of a shared text document.
pub struct Document {
    replica_id: ReplicaId,
    clock: ReplicaClock,
    state: Mutex<DocState>,
    notifier: ChangeNotifier,
    config: DocumentConfig,
}

impl Document {
    /// Creates an empty document.
    pub fn new(config: DocumentConfig) -> Self {
        Self::with_store(SequenceStore::new(), config)
    }

    /// Creates an empty document with a fixed replica id.
    pub fn with_replica(replica_id: ReplicaId) -> Self {
        Self::new(DocumentConfig::with_replica(replica_id))
    }

    /// Restores a document from [`Document::encode_snapshot`] output.
    ///
    /// The restored replica continues its counter where the snapshot left
    /// off, whether it keeps a previous replica id or gets a fresh one.
    pub fn from_snapshot(bytes: &[u8], config: DocumentConfig) -> Result<Self> {
        let store = Snapshot::decode(bytes)?.restore()?;
        Ok(Self::with_store(store, config))
    }

    fn with_store(store: SequenceStore, config: DocumentConfig) -> Self {
        let replica_id = config.replica_id.unwrap_or_else(random_replica_id);
        let clock = ReplicaClock::starting_at(replica_id, store.state_vector().get(replica_id));
        debug!(replica = replica_id, items = store.total_len(), "opened document");

        Document {
            replica_id,
            clock,
            state: Mutex::new(DocState {
                store,
                pending: PendingBuffer::new(),
            }),
            notifier: ChangeNotifier::new(),
            config,
        }
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    /// Inserts `text` so that it starts at visible character `offset`.
    ///
    /// Every character becomes its own item, chained to the previous one.
    pub fn insert_text(&self, offset: usize, text: &str) -> Result<()> {
        let count = text.chars().count();
        let settled = {
            let mut state = self.state.lock();
            let (mut left, right) = state.store.origins_at(offset)?;
            if count == 0 {
                return Ok(());
            }
            // Reserve up front so a failure cannot leave half the text behind
            if self.clock.next_counter().checked_add(count as u64).is_none() {
                return Err(SyncError::CounterOverflow(self.replica_id));
            }

            for value in text.chars() {
                let id = self.clock.tick()?;
                state.store.insert(Item::new(id, value, left, right))?;
                left = Some(id);
            }
            debug!(replica = self.replica_id, offset, count, "local insert");
            state.store.text().to_owned()
        };

        self.notify(settled, ChangeOrigin::Local);
        Ok(())
    }

    /// Deletes `length` visible characters starting at `offset`.
    pub fn delete_range(&self, offset: usize, length: usize) -> Result<()> {
        let end = offset
            .checked_add(length)
            .ok_or(SyncError::PositionOutOfBounds {
                position: usize::MAX,
                length: 0,
            })?;
        let settled = {
            let mut state = self.state.lock();
            let targets = state.store.visible_range(offset, end)?;
            if targets.is_empty() {
                return Ok(());
            }
            for id in targets {
                state.store.delete(id)?;
            }
            debug!(replica = self.replica_id, offset, length, "local delete");
            state.store.text().to_owned()
        };

        self.notify(settled, ChangeOrigin::Local);
        Ok(())
    }

    /// The visible text.
    pub fn get_text(&self) -> String {
        self.state.lock().store.text().to_owned()
    }

    /// Number of visible characters.
    pub fn len(&self) -> usize {
        self.state.lock().store.visible_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a callback run with the new text after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn state_vector(&self) -> StateVector {
        self.state.lock().store.state_vector().clone()
    }

    /// Number of remote operations waiting for a dependency.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn encode_state_vector(&self) -> Result<Vec<u8>> {
        self.state_vector().encode()
    }

    /// Everything a peer with state vector `peer` is missing.
    pub fn update_since(&self, peer: &StateVector) -> Update {
        Update::new(self.state.lock().store.operations_since(peer))
    }

    /// Encodes what a peer is missing given its encoded state vector.
    ///
    /// An empty vector yields the full document.
    pub fn encode_update_since(&self, peer_vector: &[u8]) -> Result<Vec<u8>> {
        let peer = StateVector::decode(peer_vector)?;
        let update = self.update_since(&peer);
        debug!(
            replica = self.replica_id,
            records = update.len(),
            "encoded update"
        );
        update.encode()
    }

    /// Decodes and merges an update.
    ///
    /// A payload that does not decode is rejected whole and leaves the
    /// document untouched.
    pub fn apply_update(&self, bytes: &[u8]) -> Result<()> {
        let update = Update::decode(bytes)?;
        self.apply(update)
    }

    /// Merges an already decoded update.
    ///
    /// Operations with missing dependencies are buffered. If any buffered
    /// operation has waited longer than the configured timeout, the oldest is
    /// reported as `MissingDependency`; the update itself still applied.
    pub fn apply(&self, update: Update) -> Result<()> {
        update.validate()?;
        let now = Utc::now();
        let (outcome, settled, overdue) = {
            let mut state = self.state.lock();
            let DocState { store, pending } = &mut *state;
            let outcome = apply_remote(store, pending, update.records, now)?;

            // Our own earlier items can come back from a peer after a restore
            let seen = store.state_vector().get(self.replica_id);
            if let Some(last) = seen.checked_sub(1) {
                self.clock.advance_past(last);
            }

            let settled = outcome.changed().then(|| store.text().to_owned());
            let overdue = pending
                .overdue(now, self.config.pending_timeout())
                .first()
                .map(|parked| (parked.operation.id(), parked.missing, now - parked.since));
            (outcome, settled, overdue)
        };

        if let Some(text) = settled {
            self.notify(text, ChangeOrigin::Remote);
        }
        self.report_overdue(outcome, overdue)
    }

    fn report_overdue(
        &self,
        outcome: MergeOutcome,
        overdue: Option<Overdue>,
    ) -> Result<()> {
        match overdue {
            Some((operation, missing, waited)) => {
                warn!(
                    replica = self.replica_id,
                    operation = %operation,
                    missing = %missing,
                    waited_ms = waited.num_milliseconds(),
                    applied = outcome.applied,
                    "operation still waiting for dependency"
                );
                Err(SyncError::MissingDependency {
                    operation,
                    missing,
                    waited_ms: waited.num_milliseconds(),
                })
            }
            None => Ok(()),
        }
    }

    /// Serializes every item and the state vector for persistence.
    pub fn encode_snapshot(&self) -> Result<Vec<u8>> {
        Snapshot::capture(&self.state.lock().store).encode()
    }

    /// Insert records for the whole document plus all deletions.
    pub fn operations(&self) -> Vec<Operation> {
        self.state
            .lock()
            .store
            .operations_since(&StateVector::new())
    }

    fn notify(&self, text: String, origin: ChangeOrigin) {
        self.notifier.notify(&ChangeEvent { text, origin });
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

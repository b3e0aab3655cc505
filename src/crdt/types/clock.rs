//! Thread-safe per-replica counter for minting operation identifiers.
//!
//! This module contains the ReplicaClock struct which hands out the strictly
//! increasing counters a replica stamps onto the items it authors.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::crdt::types::operation_id::OperationId;
use crate::crdt::types::replica::ReplicaId;
use crate::error::{Result, SyncError};

/// A thread-safe clock for minting operation ids of one replica.
pub struct ReplicaClock {
    next: AtomicU64,
    replica_id: ReplicaId,
}

impl ReplicaClock {
    /// Creates a new clock whose first id has counter 0
    pub fn new(replica_id: ReplicaId) -> Self {
        Self::starting_at(replica_id, 0)
    }

    /// Creates a clock that continues an existing operation sequence
    pub fn starting_at(replica_id: ReplicaId, next: u64) -> Self {
        ReplicaClock {
            next: AtomicU64::new(next),
            replica_id,
        }
    }

    /// Mints the next operation id for this replica.
    ///
    /// Fails with `CounterOverflow` once the counter space is exhausted; the
    /// clock never wraps around.
    pub fn tick(&self) -> Result<OperationId> {
        let counter = self
            .next
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |current| {
                current.checked_add(1)
            })
            .map_err(|_| SyncError::CounterOverflow(self.replica_id))?;

        Ok(OperationId::new(self.replica_id, counter))
    }

    /// Moves the clock past `counter` if it has not already gone beyond it.
    ///
    /// Needed when items authored under this replica id arrive from elsewhere,
    /// e.g. a restored session receiving its own earlier edits back.
    pub fn advance_past(&self, counter: u64) {
        let wanted = counter.saturating_add(1);
        let mut current_val = self.next.load(AtomicOrdering::SeqCst);

        while current_val < wanted {
            match self.next.compare_exchange_weak(
                current_val,
                wanted,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current_val = actual,
            }
        }
    }

    /// Gets the counter the next minted id will carry
    pub fn next_counter(&self) -> u64 {
        self.next.load(AtomicOrdering::SeqCst)
    }

    /// Gets the replica ID
    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }
}

//! Buffer for remote operations whose causal dependencies have not arrived.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use crate::crdt::operation::Operation;
use crate::crdt::types::OperationId;

/// An operation waiting in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Parked {
    pub operation: Operation,
    /// The dependency it is currently waiting for
    pub missing: OperationId,
    /// When the operation first entered the buffer
    pub since: DateTime<Utc>,
}

/// Identity of a parked operation, used to drop duplicate deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ParkedKey {
    Insert(OperationId),
    Delete(OperationId),
}

impl From<&Operation> for ParkedKey {
    fn from(op: &Operation) -> Self {
        match op {
            Operation::Insert { id, .. } => ParkedKey::Insert(*id),
            Operation::Delete { id } => ParkedKey::Delete(*id),
        }
    }
}

/// Operations keyed by the id they are waiting for.
///
/// Nothing is ever dropped because it waited too long; an operation leaves
/// the buffer only when its dependency is released.
#[derive(Debug, Clone, Default)]
pub struct PendingBuffer {
    waiting: HashMap<OperationId, Vec<Parked>>,
    parked: HashSet<ParkedKey>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `operation` until `missing` arrives.
    ///
    /// Returns false if the same operation is already parked.
    pub fn park(&mut self, operation: Operation, missing: OperationId, since: DateTime<Utc>) -> bool {
        if !self.parked.insert(ParkedKey::from(&operation)) {
            return false;
        }
        self.waiting.entry(missing).or_default().push(Parked {
            operation,
            missing,
            since,
        });
        true
    }

    /// Removes and returns everything that was waiting for `arrived`.
    pub fn release(&mut self, arrived: OperationId) -> Vec<Parked> {
        let released = self.waiting.remove(&arrived).unwrap_or_default();
        for parked in &released {
            self.parked.remove(&ParkedKey::from(&parked.operation));
        }
        released
    }

    /// Whether an identical operation is already parked.
    pub fn contains(&self, operation: &Operation) -> bool {
        self.parked.contains(&ParkedKey::from(operation))
    }

    pub fn len(&self) -> usize {
        self.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    /// Parked operations that have waited longer than `limit`, oldest first.
    pub fn overdue(&self, now: DateTime<Utc>, limit: Duration) -> Vec<&Parked> {
        let mut overdue: Vec<&Parked> = self
            .waiting
            .values()
            .flatten()
            .filter(|parked| now - parked.since > limit)
            .collect();
        overdue.sort_by_key(|parked| (parked.since, parked.operation.id()));
        overdue
    }
}

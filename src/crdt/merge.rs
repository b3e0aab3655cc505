//! Integration of remote operations.
//!
//! Operations may arrive duplicated, out of order, or ahead of the items they
//! depend on. Satisfiable operations are applied right away; the rest wait in
//! the [`PendingBuffer`] and are retried from an explicit worklist as soon as
//! the id they wait for is integrated.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::crdt::operation::Operation;
use crate::crdt::pending::PendingBuffer;
use crate::crdt::store::SequenceStore;
use crate::crdt::types::OperationId;
use crate::error::Result;

/// What a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Operations that changed the document
    pub applied: usize,
    /// Operations that were already incorporated (or already buffered)
    pub skipped: usize,
    /// Operations newly placed in the pending buffer
    pub buffered: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Applies `operations` to `store`, parking whatever cannot apply yet.
pub fn apply_remote(
    store: &mut SequenceStore,
    pending: &mut PendingBuffer,
    operations: Vec<Operation>,
    now: DateTime<Utc>,
) -> Result<MergeOutcome> {
    let mut outcome = MergeOutcome::default();
    let mut queue: VecDeque<(Operation, DateTime<Utc>)> =
        operations.into_iter().map(|op| (op, now)).collect();

    while let Some((operation, since)) = queue.pop_front() {
        if is_incorporated(store, &operation) {
            outcome.skipped += 1;
            continue;
        }

        if let Some(missing) = first_missing(store, &operation) {
            trace!(id = %operation.id(), missing = %missing, "buffering operation");
            if pending.park(operation, missing, since) {
                outcome.buffered += 1;
            } else {
                outcome.skipped += 1;
            }
            continue;
        }

        let id = operation.id();
        let changed = match operation.into_item() {
            Some(item) => store.insert(item)?,
            None => store.delete(id)?,
        };
        if changed {
            outcome.applied += 1;
        }

        // Whatever waited on this id may be satisfiable now
        queue.extend(
            pending
                .release(id)
                .into_iter()
                .map(|parked| (parked.operation, parked.since)),
        );
    }

    debug!(
        applied = outcome.applied,
        skipped = outcome.skipped,
        buffered = outcome.buffered,
        pending = pending.len(),
        "merged remote operations"
    );
    Ok(outcome)
}

fn is_incorporated(store: &SequenceStore, operation: &Operation) -> bool {
    match operation {
        Operation::Insert { id, .. } => store.contains(id),
        Operation::Delete { id } => store.get(id).is_some_and(|item| item.deleted),
    }
}

fn first_missing(store: &SequenceStore, operation: &Operation) -> Option<OperationId> {
    operation.dependencies().into_iter().find(|dep| match operation {
        // The author's previous item is tracked by the state vector
        Operation::Insert { id, .. } if Some(*dep) == id.predecessor() => {
            !store.state_vector().contains(dep)
        }
        _ => !store.contains(dep),
    })
}

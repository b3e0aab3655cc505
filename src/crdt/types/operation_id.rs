//! Operation identifier implementation for document items.
//!
//! This module contains the OperationId struct which serves as the globally
//! unique identifier of every item inserted into a document.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::crdt::types::replica::ReplicaId;

/// A unique identifier for each character/item in the document.
///
/// An OperationId is minted exactly once, by the replica that authored the
/// insertion, from that replica's strictly increasing counter. The pair is
/// therefore globally unique without coordination.
///
/// # Ordering
///
/// Ids are ordered by counter first and replica second. The order is only
/// used for stable iteration (for example when encoding); the position of an
/// item in the document is derived from its origins, never from this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId {
    /// The replica that created this item
    pub replica: ReplicaId,
    /// Position of this item in its author's operation sequence, from 0
    pub counter: u64,
}

impl OperationId {
    /// Creates a new OperationId from a replica and counter
    pub fn new(replica: ReplicaId, counter: u64) -> Self {
        OperationId { replica, counter }
    }

    /// Gets the counter value
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Gets the authoring replica
    pub fn replica(&self) -> ReplicaId {
        self.replica
    }

    /// The id minted by the same replica immediately before this one, if any.
    pub fn predecessor(&self) -> Option<OperationId> {
        self.counter
            .checked_sub(1)
            .map(|counter| OperationId::new(self.replica, counter))
    }
}

impl PartialOrd for OperationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OperationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.replica.cmp(&other.replica))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.replica, self.counter)
    }
}

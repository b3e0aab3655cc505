//! Item definition for the text CRDT.
//!
//! This module contains the Item struct which represents one inserted
//! character together with the causal origins it was inserted between.

use serde::{Deserialize, Serialize};

use crate::crdt::types::OperationId;

/// Represents a single character within the document.
///
/// Each item contains:
/// - A unique identifier minted by its author
/// - The character content
/// - The left/right origins observed when it was inserted
/// - A deletion flag that acts as a tombstone for logical deletion
///
/// # Tombstone Deletion
///
/// Items are never physically removed. Other items may use a deleted item as
/// an origin, so it must stay in the sequence to keep placement decisions
/// reproducible on every replica. `deleted` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier of this item
    pub id: OperationId,
    /// The character content of this item
    pub value: char,
    /// Item immediately to the left at insertion time (None = document start)
    pub origin_left: Option<OperationId>,
    /// Item immediately to the right at insertion time (None = document end)
    pub origin_right: Option<OperationId>,
    /// Whether this item has been logically deleted (tombstone)
    #[serde(default)]
    pub deleted: bool,
}

impl Item {
    /// Creates a new live item.
    pub fn new(
        id: OperationId,
        value: char,
        origin_left: Option<OperationId>,
        origin_right: Option<OperationId>,
    ) -> Self {
        Item {
            id,
            value,
            origin_left,
            origin_right,
            deleted: false,
        }
    }

    /// Iterates over the non-null origins.
    pub fn origins(&self) -> impl Iterator<Item = OperationId> {
        self.origin_left.into_iter().chain(self.origin_right)
    }

    /// Returns true if this item is part of the visible text.
    pub fn is_visible(&self) -> bool {
        !self.deleted
    }

    /// Marks this item as deleted (creates a tombstone).
    ///
    /// Returns false when the item was already a tombstone.
    pub fn delete(&mut self) -> bool {
        !std::mem::replace(&mut self.deleted, true)
    }
}

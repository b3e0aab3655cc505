//! Core sequence store of the text CRDT.
//!
//! This module contains the SequenceStore, which owns every item of a
//! document and decides where concurrently inserted items are placed.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::crdt::item::Item;
use crate::crdt::materializer::Materializer;
use crate::crdt::operation::Operation;
use crate::crdt::types::{OperationId, StateVector};
use crate::error::{Result, SyncError};

/// The ordered collection of items of one replica.
///
/// # Design
///
/// - Items live in an arena keyed by `OperationId`; origins are ids, never
///   references, so there is no shared ownership between items
/// - `order` caches the linearization; it is only ever changed by
///   [`SequenceStore::insert`], which places each item with the integration
///   rule below, so it always equals the order derived from the origin links
/// - Deletion only sets the tombstone flag
///
/// # Integration
///
/// A new item is placed somewhere between its left and right origin. Every
/// item already in that span was inserted concurrently. The span is scanned
/// left to right and the new item skips past:
/// - items sharing its left origin whose author id is smaller
/// - items whose left origin lies inside the already skipped part of the
///   span (they belong to a skipped sibling's subtree)
///
/// The scan stops at the first item that belongs to neither group. Two
/// replicas holding the same items therefore agree on every position no
/// matter the order in which the items arrived.
#[derive(Debug, Clone, Default)]
pub struct SequenceStore {
    items: HashMap<OperationId, Item>,
    order: Vec<OperationId>,
    state_vector: StateVector,
    materializer: Materializer,
}

impl SequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from items listed in document order.
    ///
    /// No placement is recomputed. The items are checked for duplicates,
    /// dangling origins and gaps in any author's counters.
    pub fn from_ordered(items: Vec<Item>) -> Result<Self> {
        let mut store = SequenceStore::new();

        for item in items {
            if store.items.contains_key(&item.id) {
                return Err(SyncError::MalformedPayload(format!(
                    "duplicate item {}",
                    item.id
                )));
            }
            store.order.push(item.id);
            store.items.insert(item.id, item);
        }

        let mut per_replica: HashMap<_, Vec<u64>> = HashMap::new();
        for item in store.items.values() {
            if let Some(missing) = item.origins().find(|o| !store.items.contains_key(o)) {
                return Err(SyncError::MalformedPayload(format!(
                    "item {} references missing origin {}",
                    item.id, missing
                )));
            }
            per_replica
                .entry(item.id.replica)
                .or_default()
                .push(item.id.counter);
        }

        for (replica, mut counters) in per_replica {
            counters.sort_unstable();
            if counters.iter().enumerate().any(|(i, c)| *c != i as u64) {
                return Err(SyncError::MalformedPayload(format!(
                    "items of replica {} are not contiguous",
                    replica
                )));
            }
            if let Some(last) = counters.last() {
                store.state_vector.advance(OperationId::new(replica, *last));
            }
        }

        Ok(store)
    }

    pub fn contains(&self, id: &OperationId) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &OperationId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn state_vector(&self) -> &StateVector {
        &self.state_vector
    }

    /// Number of items including tombstones.
    pub fn total_len(&self) -> usize {
        self.order.len()
    }

    /// Number of visible characters.
    pub fn visible_len(&mut self) -> usize {
        self.materializer.visible(&self.order, &self.items).len()
    }

    /// Items in document order, tombstones included.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// The visible text.
    pub fn text(&mut self) -> &str {
        self.materializer.text(&self.order, &self.items)
    }

    /// Integrates `item` into the sequence.
    ///
    /// Returns false without touching anything if the id is already present.
    /// Both origins and the author's previous item must already exist;
    /// otherwise the call fails with `UnknownOperation`.
    pub fn insert(&mut self, item: Item) -> Result<bool> {
        if self.items.contains_key(&item.id) {
            return Ok(false);
        }
        let missing = item
            .id
            .predecessor()
            .filter(|p| !self.state_vector.contains(p))
            .or_else(|| item.origins().find(|o| !self.items.contains_key(o)));
        if let Some(missing) = missing {
            return Err(SyncError::UnknownOperation(missing));
        }

        let index = self.integration_index(&item);
        trace!(id = %item.id, value = ?item.value, index, "integrating item");

        self.order.insert(index, item.id);
        self.state_vector.advance(item.id);
        self.items.insert(item.id, item);
        self.materializer.invalidate();
        Ok(true)
    }

    /// Tombstones the item `id`.
    ///
    /// Returns false if it was already deleted.
    pub fn delete(&mut self, id: OperationId) -> Result<bool> {
        let item = self
            .items
            .get_mut(&id)
            .ok_or(SyncError::UnknownOperation(id))?;

        let changed = item.delete();
        if changed {
            trace!(id = %id, "tombstoned item");
            self.materializer.invalidate();
        }
        Ok(changed)
    }

    /// Origins a character inserted at visible `offset` would get.
    ///
    /// The left origin is the visible item before the offset, the right
    /// origin whatever item (live or tombstone) directly follows it.
    pub fn origins_at(&mut self, offset: usize) -> Result<(Option<OperationId>, Option<OperationId>)> {
        let visible = self.materializer.visible(&self.order, &self.items);
        if offset > visible.len() {
            return Err(SyncError::PositionOutOfBounds {
                position: offset,
                length: visible.len(),
            });
        }

        let right_index = match offset {
            0 => 0,
            _ => visible[offset - 1] + 1,
        };
        let left = offset
            .checked_sub(1)
            .map(|i| self.order[visible[i]]);
        let right = self.order.get(right_index).copied();
        Ok((left, right))
    }

    /// Ids of the visible items in `start..end`.
    pub fn visible_range(&mut self, start: usize, end: usize) -> Result<Vec<OperationId>> {
        let visible = self.materializer.visible(&self.order, &self.items);
        if start > end || end > visible.len() {
            return Err(SyncError::PositionOutOfBounds {
                position: end.max(start),
                length: visible.len(),
            });
        }
        Ok(visible[start..end].iter().map(|i| self.order[*i]).collect())
    }

    /// Records a peer with `peer` incorporated is missing.
    ///
    /// Inserts come first, grouped per author in counter order, followed by a
    /// delete record for every tombstone held locally.
    pub fn operations_since(&self, peer: &StateVector) -> Vec<Operation> {
        let mut missing: Vec<&Item> = self
            .items
            .values()
            .filter(|item| !peer.contains(&item.id))
            .collect();
        missing.sort_unstable_by_key(|item| (item.id.replica, item.id.counter));

        let mut deleted: Vec<OperationId> = self
            .items
            .values()
            .filter(|item| item.deleted)
            .map(|item| item.id)
            .collect();
        deleted.sort_unstable_by_key(|id| (id.replica, id.counter));

        missing
            .into_iter()
            .map(Operation::insert)
            .chain(deleted.into_iter().map(|id| Operation::Delete { id }))
            .collect()
    }

    fn position_of(&self, id: &OperationId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Index in `order` at which `item` belongs.
    fn integration_index(&self, item: &Item) -> usize {
        let mut left = item.origin_left.and_then(|id| self.position_of(&id));
        let right = item
            .origin_right
            .and_then(|id| self.position_of(&id))
            .unwrap_or(self.order.len());

        let mut before_origin: HashSet<OperationId> = HashSet::new();
        let mut conflicting: HashSet<OperationId> = HashSet::new();

        let mut index = left.map_or(0, |l| l + 1);
        while index < right {
            let other = &self.items[&self.order[index]];
            before_origin.insert(other.id);
            conflicting.insert(other.id);

            if other.origin_left == item.origin_left {
                if other.id.replica < item.id.replica {
                    left = Some(index);
                    conflicting.clear();
                } else if other.origin_right == item.origin_right {
                    break;
                }
            } else if let Some(origin) = other
                .origin_left
                .filter(|origin| before_origin.contains(origin))
            {
                if !conflicting.contains(&origin) {
                    left = Some(index);
                    conflicting.clear();
                }
            } else {
                break;
            }
            index += 1;
        }

        left.map_or(0, |l| l + 1)
    }
}

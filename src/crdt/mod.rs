//! CRDT (Conflict-free Replicated Data Type) implementation module.
//!
//! This module contains the sequence CRDT behind collaborative text editing
//! and all its supporting types and structures.

pub mod item;
pub mod materializer;
pub mod merge;
pub mod notifier;
pub mod operation;
pub mod pending;
pub mod store;
pub mod types;

// Re-export the main public API
pub use item::Item;
pub use materializer::Materializer;
pub use merge::{MergeOutcome, apply_remote};
pub use notifier::{ChangeEvent, ChangeNotifier, ChangeOrigin, Subscription};
pub use operation::Operation;
pub use pending::{Parked, PendingBuffer};
pub use store::SequenceStore;
pub use types::{OperationId, ReplicaClock, ReplicaId, StateVector, random_replica_id};

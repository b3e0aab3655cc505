//! Type definitions for the text CRDT.
//!
//! This module contains the fundamental identity types used throughout the
//! engine, organized into focused submodules.

pub mod clock;
pub mod operation_id;
pub mod replica;
pub mod state_vector;

pub use clock::ReplicaClock;
pub use operation_id::OperationId;
pub use replica::{ReplicaId, random_replica_id};
pub use state_vector::StateVector;

//! Replica identifier type and related functionality.
//!
//! This module contains the definition of ReplicaId, which uniquely identifies
//! each participant in the distributed CRDT system.

/// A unique identifier for each replica (collaborator) in the distributed system.
///
/// Each open session of a document gets its own replica ID. Replica IDs are
/// compared numerically when concurrent insertions at the same position need
/// a deterministic order: the smaller ID is placed first.
pub type ReplicaId = u64;

/// Draws a fresh random replica ID.
///
/// 64 random bits make collisions between the handful of sessions editing
/// one document practically impossible.
pub fn random_replica_id() -> ReplicaId {
    rand::random()
}

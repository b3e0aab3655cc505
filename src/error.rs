//! Error types for the text synchronization engine.

use thiserror::Error;

use crate::crdt::types::{OperationId, ReplicaId};

/// Errors surfaced by local edits, merges and the sync codec.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A direct store insert/delete referenced an id that does not exist locally.
    #[error("unknown operation {0}")]
    UnknownOperation(OperationId),

    /// An operation has been buffered longer than the configured bound.
    ///
    /// The operation is kept; this is a diagnostic, not a failure of the update.
    #[error("operation {operation} still waiting for {missing} after {waited_ms}ms")]
    MissingDependency {
        operation: OperationId,
        missing: OperationId,
        waited_ms: i64,
    },

    /// Sync bytes could not be decoded; nothing was applied.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The local counter space is exhausted.
    #[error("counter overflow for replica {0}")]
    CounterOverflow(ReplicaId),

    /// A local edit addressed text outside the visible document.
    #[error("position {position} out of bounds (length: {length})")]
    PositionOutOfBounds { position: usize, length: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

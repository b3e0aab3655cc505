//! Wire formats used to exchange document state between replicas.
//!
//! Everything is JSON: a state vector is a `replicaId -> counter` object, an
//! update is an array of insert/delete records, a snapshot carries the full
//! item list plus the state vector.

pub mod protocol;
pub mod snapshot;
pub mod update;

pub use protocol::SyncMessage;
pub use snapshot::Snapshot;
pub use update::Update;

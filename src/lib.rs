//! # crdt-text - Replicated text synchronization
//!
//! A Conflict-free Replicated Data Type (CRDT) for shared plain text, suitable
//! for collaborative editing where replicas edit concurrently, go offline and
//! reconcile later by exchanging opaque byte payloads.
//!
//! ## Features
//!
//! - **Conflict-free**: Concurrent edits merged in any order converge to the same text
//! - **Causally safe**: Operations whose dependencies are missing are buffered, not dropped
//! - **Idempotent**: Re-delivered updates are skipped
//! - **State-vector sync**: Peers exchange only the operations the other side lacks
//! - **Tombstone-based deletion**: Deleted characters stay as anchors for concurrent inserts
//!
//! ## Example
//!
//! ```rust
//! use crdt_text::Document;
//!
//! let alice = Document::with_replica(1);
//! let bob = Document::with_replica(2);
//!
//! alice.insert_text(0, "Hi").unwrap();
//! bob.insert_text(0, "Yo").unwrap();
//!
//! let to_bob = alice.encode_update_since(&bob.encode_state_vector().unwrap()).unwrap();
//! let to_alice = bob.encode_update_since(&alice.encode_state_vector().unwrap()).unwrap();
//! bob.apply_update(&to_bob).unwrap();
//! alice.apply_update(&to_alice).unwrap();
//!
//! assert_eq!(alice.get_text(), "HiYo");
//! assert_eq!(bob.get_text(), "HiYo");
//! ```

pub mod config;
pub mod crdt;
pub mod document;
pub mod error;
pub mod server;
pub mod sync;

// Re-export the main public API
pub use config::{DocumentConfig, ServerConfig};
pub use crdt::{ChangeEvent, ChangeOrigin, Item, Operation, OperationId, ReplicaId, StateVector, Subscription};
pub use document::Document;
pub use error::{Result, SyncError};
pub use sync::{Snapshot, SyncMessage, Update};

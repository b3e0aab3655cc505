//! Persistable image of a document.

use serde::{Deserialize, Serialize};

use crate::crdt::{Item, SequenceStore, StateVector};
use crate::error::{Result, SyncError};

/// Every item in document order, tombstones included, plus the state vector.
///
/// Restoring a snapshot reproduces the document exactly; placement is read
/// from the stored order rather than recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub state_vector: StateVector,
}

impl Snapshot {
    pub fn capture(store: &SequenceStore) -> Self {
        Snapshot {
            items: store.iter().cloned().collect(),
            state_vector: store.state_vector().clone(),
        }
    }

    /// Rebuilds the store, checking the stored vector matches the items.
    pub fn restore(self) -> Result<SequenceStore> {
        let store = SequenceStore::from_ordered(self.items)?;
        if *store.state_vector() != self.state_vector {
            return Err(SyncError::MalformedPayload(
                "snapshot state vector does not match its items".to_string(),
            ));
        }
        Ok(store)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }
}

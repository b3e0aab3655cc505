//! Per-replica progress summary used to compute sync diffs.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::BTreeMap;

use crate::crdt::types::operation_id::OperationId;
use crate::crdt::types::replica::ReplicaId;
use crate::error::{Result, SyncError};

/// Maps each known replica to the number of its items incorporated locally.
///
/// Items of one replica are incorporated in counter order without gaps, so
/// the stored value is also the counter of the next item expected from that
/// replica. Entries never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateVector(BTreeMap<ReplicaId, u64>);

// JSON object keys reach us as strings when the vector is nested in a tagged
// message, so replica ids are parsed from the key text.
impl<'de> Deserialize<'de> for StateVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, count)| {
                key.parse::<ReplicaId>()
                    .map(|replica| (replica, count))
                    .map_err(|e| de::Error::custom(format!("invalid replica id {:?}: {}", key, e)))
            })
            .collect()
    }
}

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items from `replica` incorporated; 0 for unseen replicas.
    pub fn get(&self, replica: ReplicaId) -> u64 {
        self.0.get(&replica).copied().unwrap_or(0)
    }

    /// Whether the item `id` is covered by this vector.
    pub fn contains(&self, id: &OperationId) -> bool {
        id.counter < self.get(id.replica)
    }

    /// Records that `id` has been incorporated.
    pub fn advance(&mut self, id: OperationId) {
        let entry = self.0.entry(id.replica).or_insert(0);
        *entry = (*entry).max(id.counter.saturating_add(1));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReplicaId, u64)> + '_ {
        self.0.iter().map(|(replica, count)| (*replica, *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the vector as a `replicaId -> counter` JSON object.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }

    /// Parses a vector produced by [`StateVector::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }
}

impl FromIterator<(ReplicaId, u64)> for StateVector {
    fn from_iter<T: IntoIterator<Item = (ReplicaId, u64)>>(iter: T) -> Self {
        StateVector(iter.into_iter().collect())
    }
}

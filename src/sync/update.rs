//! Operation batches exchanged during sync.

use serde::{Deserialize, Serialize};

use crate::crdt::Operation;
use crate::error::{Result, SyncError};

/// A self-contained, replayable batch of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update {
    pub records: Vec<Operation>,
}

impl Update {
    pub fn new(records: Vec<Operation>) -> Self {
        Update { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks every record; one bad record rejects the whole batch.
    pub fn validate(&self) -> Result<()> {
        self.records
            .iter()
            .try_for_each(|record| record.validate().map_err(SyncError::MalformedPayload))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }

    /// Parses and validates an encoded batch.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let update: Update =
            serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedPayload(e.to_string()))?;
        update.validate()?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::OperationId;

    #[test]
    fn test_batch_is_a_plain_array() {
        let update = Update::new(vec![Operation::Delete {
            id: OperationId::new(3, 1),
        }]);
        let bytes = update.encode().unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&bytes).unwrap(),
            serde_json::json!([{ "op": "delete", "id": { "replica": 3, "counter": 1 } }])
        );
        assert_eq!(Update::decode(&bytes).unwrap(), update);
    }

    #[test]
    fn test_decode_rejects_unknown_record() {
        let bytes = br#"[{ "op": "move", "id": { "replica": 1, "counter": 0 } }]"#;
        assert!(matches!(
            Update::decode(bytes),
            Err(SyncError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_rejects_multi_char_value() {
        let bytes = br#"[{ "op": "insert", "id": { "replica": 1, "counter": 0 },
                          "value": "ab", "origin_left": null, "origin_right": null }]"#;
        assert!(Update::decode(bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_self_origin() {
        let bytes = br#"[{ "op": "insert", "id": { "replica": 1, "counter": 2 },
                          "value": "a", "origin_left": { "replica": 1, "counter": 2 },
                          "origin_right": null }]"#;
        assert!(matches!(
            Update::decode(bytes),
            Err(SyncError::MalformedPayload(_))
        ));
    }
}

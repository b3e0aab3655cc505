//! Messages of the websocket sync protocol.
//!
//! A session opens with each side announcing its state vector
//! (`SyncStep1`); the other side answers with what is missing
//! (`SyncStep2`). Afterwards edits flow as `Update` messages.

use serde::{Deserialize, Serialize};

use crate::crdt::StateVector;
use crate::error::{Result, SyncError};
use crate::sync::update::Update;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    SyncStep1 { state_vector: StateVector },
    SyncStep2 { update: Update },
    Update { update: Update },
}

impl SyncMessage {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }

    /// Parses a frame, validating any carried update.
    pub fn decode(text: &str) -> Result<Self> {
        let message: SyncMessage =
            serde_json::from_str(text).map_err(|e| SyncError::MalformedPayload(e.to_string()))?;
        if let SyncMessage::SyncStep2 { update } | SyncMessage::Update { update } = &message {
            update.validate()?;
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step1_shape() {
        let message = SyncMessage::SyncStep1 {
            state_vector: [(4, 2)].into_iter().collect(),
        };
        let text = message.encode().unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            serde_json::json!({ "type": "sync_step1", "state_vector": { "4": 2 } })
        );
        assert_eq!(SyncMessage::decode(&text).unwrap(), message);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            SyncMessage::decode("hello"),
            Err(SyncError::MalformedPayload(_))
        ));
    }
}

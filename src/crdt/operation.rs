//! Replicated operations exchanged between replicas.

use serde::{Deserialize, Serialize};

use crate::crdt::item::Item;
use crate::crdt::types::OperationId;

/// A single insert or delete record.
///
/// Inserts carry everything needed to place the character on any replica;
/// deletes only reference the id of the item they tombstone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Insert {
        id: OperationId,
        value: char,
        origin_left: Option<OperationId>,
        origin_right: Option<OperationId>,
    },
    Delete {
        id: OperationId,
    },
}

impl Operation {
    /// The item id this operation creates or tombstones.
    pub fn id(&self) -> OperationId {
        match self {
            Operation::Insert { id, .. } | Operation::Delete { id } => *id,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert { .. })
    }

    /// Insert record for `item`, dropping its local tombstone flag.
    pub fn insert(item: &Item) -> Self {
        Operation::Insert {
            id: item.id,
            value: item.value,
            origin_left: item.origin_left,
            origin_right: item.origin_right,
        }
    }

    /// Ids that must be present locally before this operation can apply.
    ///
    /// An insert depends on its origins and on the previous item of the same
    /// author; a delete depends on the item it removes.
    pub fn dependencies(&self) -> Vec<OperationId> {
        match self {
            Operation::Insert {
                id,
                origin_left,
                origin_right,
                ..
            } => id
                .predecessor()
                .into_iter()
                .chain(*origin_left)
                .chain(*origin_right)
                .collect(),
            Operation::Delete { id } => vec![*id],
        }
    }

    /// Checks the record is internally consistent.
    pub fn validate(&self) -> Result<(), String> {
        if let Operation::Insert {
            id,
            origin_left,
            origin_right,
            ..
        } = self
        {
            if *origin_left == Some(*id) || *origin_right == Some(*id) {
                return Err(format!("insert {} names itself as an origin", id));
            }
            if origin_left.is_some() && origin_left == origin_right {
                return Err(format!("insert {} has identical left and right origins", id));
            }
        }
        Ok(())
    }

    /// The item an insert record describes; None for deletes.
    pub fn into_item(self) -> Option<Item> {
        match self {
            Operation::Insert {
                id,
                value,
                origin_left,
                origin_right,
            } => Some(Item::new(id, value, origin_left, origin_right)),
            Operation::Delete { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dependencies() {
        let op = Operation::Insert {
            id: OperationId::new(2, 3),
            value: 'x',
            origin_left: Some(OperationId::new(1, 0)),
            origin_right: None,
        };
        assert_eq!(
            op.dependencies(),
            vec![OperationId::new(2, 2), OperationId::new(1, 0)]
        );
    }

    #[test]
    fn test_first_insert_has_no_dependencies() {
        let op = Operation::Insert {
            id: OperationId::new(2, 0),
            value: 'x',
            origin_left: None,
            origin_right: None,
        };
        assert!(op.dependencies().is_empty());
    }

    #[test]
    fn test_delete_depends_on_target() {
        let id = OperationId::new(5, 9);
        assert_eq!(Operation::Delete { id }.dependencies(), vec![id]);
    }

    #[test]
    fn test_validate_self_reference() {
        let id = OperationId::new(1, 1);
        let op = Operation::Insert {
            id,
            value: 'x',
            origin_left: Some(id),
            origin_right: None,
        };
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let op = Operation::Insert {
            id: OperationId::new(1, 0),
            value: 'H',
            origin_left: None,
            origin_right: None,
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            serde_json::json!({
                "op": "insert",
                "id": { "replica": 1, "counter": 0 },
                "value": "H",
                "origin_left": null,
                "origin_right": null
            })
        );

        let delete = Operation::Delete {
            id: OperationId::new(1, 0),
        };
        assert_eq!(
            serde_json::to_value(&delete).unwrap(),
            serde_json::json!({ "op": "delete", "id": { "replica": 1, "counter": 0 } })
        );
    }
}

//! Integration tests for the text CRDT.
//!
//! These tests verify the engine across the collaborative editing scenarios
//! it exists for: local edits, concurrent edits, out-of-order delivery and
//! state-vector synchronization.

use crdt_text::{Document, Operation, OperationId, SyncError, Update};

/// Sends everything `from` has that `to` lacks.
fn sync(from: &Document, to: &Document) {
    let vector = to.encode_state_vector().unwrap();
    let update = from.encode_update_since(&vector).unwrap();
    to.apply_update(&update).unwrap();
}

#[test]
fn test_insert_into_empty_document() {
    let a = Document::with_replica(1);
    a.insert_text(0, "Hello").unwrap();
    assert_eq!(a.get_text(), "Hello");
}

#[test]
fn test_delete_first_character() {
    let a = Document::with_replica(1);
    a.insert_text(0, "Hello").unwrap();
    a.delete_range(0, 1).unwrap();
    assert_eq!(a.get_text(), "ello");
}

#[test]
fn test_concurrent_inserts_at_same_offset_converge() {
    for a_first in [true, false] {
        let a = Document::with_replica(1);
        let b = Document::with_replica(2);

        a.insert_text(0, "Hi").unwrap();
        b.insert_text(0, "Yo").unwrap();

        if a_first {
            sync(&a, &b);
            sync(&b, &a);
        } else {
            sync(&b, &a);
            sync(&a, &b);
        }

        assert_eq!(a.get_text(), b.get_text());
        // Smaller replica id goes first at the conflicting position
        assert_eq!(a.get_text(), "HiYo");
    }
}

#[test]
fn test_delete_arriving_before_its_insert() {
    let a = Document::with_replica(1);
    let b = Document::with_replica(2);
    a.insert_text(0, "abc").unwrap();

    // B hears about the deletion of 'b' before the insert itself
    let delete = Update::new(vec![Operation::Delete {
        id: OperationId::new(1, 1),
    }]);
    b.apply_update(&delete.encode().unwrap()).unwrap();
    assert_eq!(b.get_text(), "");
    assert_eq!(b.pending_len(), 1);

    sync(&a, &b);
    assert_eq!(b.get_text(), "ac");
    assert_eq!(b.pending_len(), 0);
}

#[test]
fn test_full_sync_round_trip() {
    let a = Document::with_replica(1);
    let text: String = (0..100).map(|i| (b'a' + (i % 26) as u8) as char).collect();
    a.insert_text(0, &text).unwrap();

    let b = Document::with_replica(2);
    let update = a.encode_update_since(b"{}").unwrap();
    b.apply_update(&update).unwrap();

    assert_eq!(b.get_text(), a.get_text());
    assert_eq!(
        b.encode_state_vector().unwrap(),
        a.encode_state_vector().unwrap()
    );
}

#[test]
fn test_deletions_propagate_through_sync() {
    let a = Document::with_replica(1);
    let b = Document::with_replica(2);
    a.insert_text(0, "chorus").unwrap();
    sync(&a, &b);

    // B already has every insert; only the delete set carries the change
    a.delete_range(0, 1).unwrap();
    sync(&a, &b);
    assert_eq!(b.get_text(), "horus");
}

#[test]
fn test_concurrent_edit_and_delete() {
    let a = Document::with_replica(1);
    let b = Document::with_replica(2);
    a.insert_text(0, "line one").unwrap();
    sync(&a, &b);

    // A deletes "one" while B appends after it
    a.delete_range(5, 3).unwrap();
    b.insert_text(8, "!").unwrap();

    sync(&a, &b);
    sync(&b, &a);
    assert_eq!(a.get_text(), "line !");
    assert_eq!(b.get_text(), "line !");
}

#[test]
fn test_three_way_merge() {
    let docs = [
        Document::with_replica(1),
        Document::with_replica(2),
        Document::with_replica(3),
    ];
    docs[0].insert_text(0, "1").unwrap();
    docs[1].insert_text(0, "2").unwrap();
    docs[2].insert_text(0, "3").unwrap();

    for from in &docs {
        for to in &docs {
            if from.replica_id() != to.replica_id() {
                sync(from, to);
            }
        }
    }

    let result = docs[0].get_text();
    assert_eq!(result, "123");
    assert!(docs.iter().all(|d| d.get_text() == result));
}

#[test]
fn test_interleaved_sessions_converge() {
    let a = Document::with_replica(10);
    let b = Document::with_replica(20);

    a.insert_text(0, "The quick fox").unwrap();
    sync(&a, &b);

    a.insert_text(4, "very ").unwrap();
    b.insert_text(10, "brown ").unwrap();
    b.delete_range(0, 4).unwrap();
    a.insert_text(0, ">> ").unwrap();

    sync(&b, &a);
    sync(&a, &b);
    assert_eq!(a.get_text(), b.get_text());
    assert_eq!(a.get_text(), ">> very quick brown fox");
}

#[test]
fn test_update_since_current_vector_is_only_deletes() {
    let a = Document::with_replica(1);
    a.insert_text(0, "abc").unwrap();
    a.delete_range(1, 1).unwrap();

    let update = a.update_since(&a.state_vector());
    assert_eq!(
        update.records,
        vec![Operation::Delete {
            id: OperationId::new(1, 1)
        }]
    );
}

#[test]
fn test_malformed_payload_is_rejected_whole() {
    let a = Document::with_replica(1);
    a.insert_text(0, "x").unwrap();

    // First record is fine, second is not a valid record
    let bytes = br#"[
        { "op": "insert", "id": { "replica": 2, "counter": 0 }, "value": "y",
          "origin_left": null, "origin_right": null },
        { "op": "insert", "id": { "replica": 2, "counter": 1 } }
    ]"#;
    assert!(matches!(
        a.apply_update(bytes),
        Err(SyncError::MalformedPayload(_))
    ));
    assert_eq!(a.get_text(), "x");
    assert_eq!(a.state_vector().get(2), 0);
}

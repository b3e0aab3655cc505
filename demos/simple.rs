//! Simple standalone example of replicated text editing.
//!
//! This example demonstrates the basic functionality of the document
//! in a simple, easy-to-understand scenario.
//!
//! Run with: cargo run --example simple

use crdt_text::{ChangeOrigin, Document};

/// Ships everything `from` has that `to` is missing, as raw bytes.
fn sync(from: &Document, to: &Document) {
    let vector = to.encode_state_vector().unwrap();
    let payload = from.encode_update_since(&vector).unwrap();
    println!("  {} bytes on the wire", payload.len());
    to.apply_update(&payload).unwrap();
}

fn main() {
    println!("=== Simple Replicated Text Example ===\n");

    // Create two replicas representing two users
    let alice = Document::with_replica(1);
    let bob = Document::with_replica(2);

    let _watch = bob.subscribe(|event| {
        if event.origin == ChangeOrigin::Remote {
            println!("  [bob] remote change, now '{}'", event.text);
        }
    });

    println!("Alice (replica 1) and Bob (replica 2) start editing a document\n");

    println!("Alice types 'Hello':");
    alice.insert_text(0, "Hello").unwrap();
    println!("  Alice's document: '{}'", alice.get_text());

    // Bob concurrently types at the very same offset
    println!("\nBob concurrently types 'World!' (also from the start):");
    bob.insert_text(0, "World!").unwrap();
    println!("  Bob's document: '{}'", bob.get_text());

    println!("\n--- Synchronizing Changes ---");
    println!("Alice receives Bob's changes...");
    sync(&bob, &alice);
    println!("Bob receives Alice's changes...");
    sync(&alice, &bob);

    println!("\n--- After Synchronization ---");
    println!("  Alice sees: '{}'", alice.get_text());
    println!("  Bob sees:   '{}'", bob.get_text());

    if alice.get_text() == bob.get_text() {
        println!("\n✓ SUCCESS: Both users converged to the same document!");
        println!("✓ Final content: '{}'", alice.get_text());
    } else {
        println!("\n✗ ERROR: Documents did not converge!");
    }

    println!("\n--- Technical Details ---");
    println!("Concurrent inserts at one spot are ordered by replica id.");
    println!("  State vector: {:?}", alice.state_vector());

    println!("\n=== Deletion Example ===");
    if let Some(offset) = alice.get_text().find('W') {
        let offset = alice.get_text()[..offset].chars().count();
        println!("Alice deletes 'W'");
        alice.delete_range(offset, 1).unwrap();
        println!("  Alice's document: '{}'", alice.get_text());

        println!("Synchronizing deletion to Bob...");
        sync(&alice, &bob);
        println!("  Bob's document: '{}'", bob.get_text());

        if alice.get_text() == bob.get_text() {
            println!("✓ Deletion synchronized successfully!");
        }
    }

    println!("\n=== Example Complete ===");
    println!("Replicas exchange state vectors and only the missing");
    println!("operations, and always end up with the same text.");
}

//! Concurrent editing example across threads and replicas.
//!
//! This example showcases:
//! - Several threads editing one shared document
//! - Independent replicas that edit offline and reconcile
//! - Updates delivered out of order being buffered until they apply
//! - Deterministic conflict resolution for inserts at the same spot
//!
//! Run with: cargo run --example concurrent_editing

use crdt_text::{Document, Operation, StateVector, Update};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

fn main() {
    println!("=== Concurrent Text Editing Example ===\n");

    shared_document_demo();
    println!();

    offline_replicas_demo();
    println!();

    out_of_order_delivery_demo();
    println!();

    conflict_resolution_demo();
}

/// Every document operation takes the lock, so threads can share one replica
fn shared_document_demo() {
    println!("--- Shared Document Across Threads ---");

    let num_threads = 4;
    let operations_per_thread = 100;
    let doc = Arc::new(Document::with_replica(1));
    let changes = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&changes);
    let _watch = doc.subscribe(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    println!(
        "Starting {} threads, each performing {} operations",
        num_threads, operations_per_thread
    );
    let start_time = Instant::now();

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let doc = Arc::clone(&doc);
            thread::spawn(move || {
                let mut completed = 0;
                for i in 0..operations_per_thread {
                    let ch = (b'A' + ((thread_id * 4 + i) % 26) as u8) as char;
                    let offset = i % (doc.len() + 1);
                    // Another thread may shrink the document between len and insert
                    if doc.insert_text(offset, &ch.to_string()).is_ok() {
                        completed += 1;
                    }
                    if i % 10 == 0 && i > 0 && doc.delete_range(0, 1).is_ok() {
                        completed += 1;
                    }
                }
                completed
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let total_time = start_time.elapsed();

    println!("All threads completed!");
    println!("Total operations: {}", total);
    println!("Total time: {:?}", total_time);
    println!(
        "Operations per second: {:.2}",
        total as f64 / total_time.as_secs_f64()
    );
    println!("Change notifications: {}", changes.load(Ordering::Relaxed));
    println!("Final document length: {}", doc.len());
}

/// Replicas edit independently, then exchange state vectors and updates
fn offline_replicas_demo() {
    println!("--- Offline Replicas Reconciling ---");

    let num_replicas = 8;
    let operations_per_replica = 200;
    println!(
        "Creating {} replicas, each performing {} operations",
        num_replicas, operations_per_replica
    );

    let start_time = Instant::now();
    let handles: Vec<_> = (0..num_replicas)
        .map(|replica_idx| {
            thread::spawn(move || {
                let doc = Document::with_replica(replica_idx as u64 + 1);
                for i in 0..operations_per_replica {
                    let ch = match i % 5 {
                        0 => (b'A' + replica_idx as u8) as char,
                        1 => (b'a' + replica_idx as u8) as char,
                        2 => (b'0' + replica_idx as u8) as char,
                        3 => ' ',
                        _ => '.',
                    };
                    let offset = if i % 20 == 0 { 0 } else { doc.len() };
                    doc.insert_text(offset, &ch.to_string()).unwrap();
                    if i % 15 == 0 {
                        doc.delete_range(doc.len() / 2, 1).unwrap();
                    }
                }
                doc
            })
        })
        .collect();
    let docs: Vec<Document> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let operation_time = start_time.elapsed();
    println!("Phase 1 - Offline editing completed in {:?}", operation_time);

    println!("\nPhase 2 - Network Synchronization...");
    let sync_start = Instant::now();
    let mut bytes_sent = 0;
    for source in &docs {
        for target in &docs {
            if source.replica_id() == target.replica_id() {
                continue;
            }
            let vector = target.encode_state_vector().unwrap();
            let payload = source.encode_update_since(&vector).unwrap();
            bytes_sent += payload.len();
            target.apply_update(&payload).unwrap();
        }
    }
    let sync_time = sync_start.elapsed();

    let reference = docs[0].get_text();
    let mut all_converged = true;
    for (i, doc) in docs.iter().enumerate() {
        if doc.get_text() != reference {
            println!("ERROR: Replica {} did not converge!", i);
            all_converged = false;
        }
    }
    if all_converged {
        println!("✓ All {} replicas successfully converged!", num_replicas);
    }

    println!("Synchronization completed in {:?}", sync_time);
    println!("Bytes exchanged: {}", bytes_sent);
    println!("Final document length: {}", docs[0].len());
    println!("State vector: {:?}", docs[0].state_vector());
}

/// A replica receiving operations in reverse order buffers them until they apply
fn out_of_order_delivery_demo() {
    println!("--- Out-of-Order Delivery ---");

    let writer = Document::with_replica(1);
    writer.insert_text(0, "causality").unwrap();
    writer.delete_range(0, 1).unwrap();

    let mut records: Vec<Operation> = writer.update_since(&StateVector::new()).records;
    records.reverse();

    let reader = Document::with_replica(2);
    for record in records {
        let id = record.id();
        reader.apply(Update::new(vec![record])).unwrap();
        println!(
            "  received {:<6} -> text '{}', {} waiting",
            id.to_string(),
            reader.get_text(),
            reader.pending_len()
        );
    }

    if reader.get_text() == writer.get_text() {
        println!("✓ Reader caught up: '{}'", reader.get_text());
    } else {
        println!("✗ Reader diverged: '{}'", reader.get_text());
    }
}

/// Many replicas insert at the very same offset
fn conflict_resolution_demo() {
    println!("--- Conflict Resolution ---");

    let num_replicas = 6;
    let docs: Vec<Document> = (0..num_replicas)
        .map(|i| Document::with_replica(i as u64 + 1))
        .collect();

    println!("All replicas inserting at the start of an empty document...");
    for (idx, doc) in docs.iter().enumerate() {
        let ch = (b'A' + idx as u8) as char;
        for _ in 0..5 {
            doc.insert_text(0, &ch.to_string()).unwrap();
        }
    }

    for source in &docs {
        for target in &docs {
            if source.replica_id() != target.replica_id() {
                target.apply(source.update_since(&target.state_vector())).unwrap();
            }
        }
    }

    let reference = docs[0].get_text();
    if docs.iter().all(|d| d.get_text() == reference) {
        println!("✓ Perfect conflict resolution! All replicas have identical state.");
        println!("✓ Final content: '{}'", reference);

        let mut char_counts: HashMap<char, usize> = HashMap::new();
        for ch in reference.chars() {
            *char_counts.entry(ch).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = char_counts.into_iter().collect();
        counts.sort();
        println!("Character distribution:");
        for (ch, count) in counts {
            println!("  '{}': {} occurrences", ch, count);
        }
    } else {
        println!("✗ Conflict resolution failed - replicas have different states");
    }
}

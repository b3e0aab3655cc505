//! Performance benchmarks for the text CRDT.
//!
//! This module benchmarks various aspects of the engine including:
//! - Sequential insertions and deletions
//! - Merging concurrent replicas
//! - Encoding and applying updates
//! - Text materialization
//!
//! Run with: cargo bench

use crdt_text::{Document, StateVector};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::thread;

fn sample_text(size: usize) -> String {
    (0..size).map(|i| (b'A' + (i % 26) as u8) as char).collect()
}

/// Benchmark typing one character at a time
fn bench_sequential_insertions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insertions");

    for size in [100, 500, 1000, 5000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("type_chars", size), size, |b, &size| {
            b.iter(|| {
                let doc = Document::with_replica(1);
                for (i, ch) in sample_text(size).chars().enumerate() {
                    doc.insert_text(i, ch.encode_utf8(&mut [0; 4])).unwrap();
                }
                black_box(doc.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("paste_block", size), size, |b, &size| {
            let text = sample_text(size);
            b.iter(|| {
                let doc = Document::with_replica(1);
                doc.insert_text(0, &text).unwrap();
                black_box(doc.len())
            });
        });
    }
    group.finish();
}

/// Benchmark backspacing through a document
fn bench_sequential_deletions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_deletions");

    for size in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("delete_chars", size), size, |b, &size| {
            b.iter_batched(
                || {
                    let doc = Document::with_replica(1);
                    doc.insert_text(0, &sample_text(size)).unwrap();
                    doc
                },
                |doc| {
                    for i in (0..size).rev() {
                        doc.delete_range(i, 1).unwrap();
                    }
                    black_box(doc.get_text())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark merging replicas that edited concurrently
fn bench_concurrent_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_merge");

    for num_replicas in [2, 4, 8].iter() {
        for ops_per_replica in [100, 500].iter() {
            let total_ops = num_replicas * ops_per_replica;
            group.throughput(Throughput::Elements(total_ops as u64));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!(
                    "replicas_{}_ops_{}",
                    num_replicas, ops_per_replica
                )),
                &(num_replicas, ops_per_replica),
                |b, &(num_replicas, ops_per_replica)| {
                    b.iter(|| {
                        // Each replica edits on its own thread
                        let handles: Vec<_> = (0..*num_replicas)
                            .map(|replica| {
                                let ops = *ops_per_replica;
                                thread::spawn(move || {
                                    let doc = Document::with_replica(replica as u64 + 1);
                                    for i in 0..ops {
                                        let ch = (b'a' + ((replica + i) % 26) as u8) as char;
                                        doc.insert_text(i / 2, &ch.to_string()).unwrap();
                                    }
                                    doc
                                })
                            })
                            .collect();
                        let docs: Vec<Document> =
                            handles.into_iter().map(|h| h.join().unwrap()).collect();

                        for source in &docs {
                            for target in &docs {
                                if source.replica_id() != target.replica_id() {
                                    let update = source.update_since(&target.state_vector());
                                    target.apply(update).unwrap();
                                }
                            }
                        }

                        let first = docs[0].get_text();
                        for doc in &docs[1..] {
                            assert_eq!(first, doc.get_text(), "Replicas did not converge");
                        }
                        black_box(first.len())
                    });
                },
            );
        }
    }
    group.finish();
}

/// Benchmark the wire path: encode on one side, decode and apply on the other
fn bench_update_exchange(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_exchange");

    let source = Document::with_replica(1);
    source
        .insert_text(0, &"The quick brown fox jumps over the lazy dog. ".repeat(50))
        .unwrap();
    for i in (0..source.len()).step_by(7).rev() {
        source.delete_range(i, 1).unwrap();
    }
    let empty = StateVector::new().encode().unwrap();

    group.bench_function("encode_full_update", |b| {
        b.iter(|| black_box(source.encode_update_since(&empty).unwrap()));
    });

    let bytes = source.encode_update_since(&empty).unwrap();
    group.bench_function("apply_full_update", |b| {
        b.iter_batched(
            || Document::with_replica(2),
            |target| {
                target.apply_update(&bytes).unwrap();
                black_box(target.len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let snapshot = source.encode_snapshot().unwrap();
            let restored = Document::from_snapshot(&snapshot, Default::default()).unwrap();
            black_box(restored.len())
        });
    });

    group.finish();
}

/// Benchmark text materialization with tombstones present
fn bench_text_materialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_materialization");

    for &size in [100usize, 1000, 5000].iter() {
        group.throughput(Throughput::Elements(size as u64));

        // Every third character is a tombstone
        let doc = Document::with_replica(1);
        doc.insert_text(0, &sample_text(size)).unwrap();
        for i in (0..size).step_by(3).rev() {
            doc.delete_range(i, 1).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("cached", size), &size, |b, _| {
            b.iter(|| black_box(doc.get_text()));
        });
        group.bench_with_input(BenchmarkId::new("after_edit", size), &size, |b, _| {
            b.iter(|| {
                doc.insert_text(0, "x").unwrap();
                doc.delete_range(0, 1).unwrap();
                black_box(doc.get_text())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_insertions,
    bench_sequential_deletions,
    bench_concurrent_merge,
    bench_update_exchange,
    bench_text_materialization
);

criterion_main!(benches);

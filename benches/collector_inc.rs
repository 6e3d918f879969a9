//! Benchmark of the update path: one `inc` is one rendezvous plus one file write.
//!
//! Run with:
//! ```bash
//! cargo bench --bench collector_inc
//! ```

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use statdir::fs::MemoryFs;
use statdir::Collector;

const NUM_THREADS: usize = 4;
const ITERATIONS_PER_THREAD: usize = 1_000;

fn bench_inc_on_disk(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    let collector = Arc::new(Collector::new(tmp.path().join("STAT")).with_counter("FOO"));
    let handle = Collector::spawn(&collector).unwrap();
    collector.wait_ready().unwrap();

    c.bench_function("inc (disk)", |b| {
        b.iter(|| collector.inc(black_box("FOO"), black_box(1)).unwrap())
    });

    collector.finish().unwrap();
    handle.join().unwrap().unwrap();
}

fn bench_inc_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("inc_in_memory");

    group.bench_function("single producer", |b| {
        let collector =
            Arc::new(Collector::with_file_system("stats", MemoryFs::new()).with_counter("FOO"));
        let handle = Collector::spawn(&collector).unwrap();
        collector.wait_ready().unwrap();

        b.iter(|| collector.inc(black_box("FOO"), black_box(1)).unwrap());

        collector.finish().unwrap();
        handle.join().unwrap().unwrap();
    });

    group.bench_function(
        BenchmarkId::new(
            "concurrent producers",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let collector = Arc::new(
                    Collector::with_file_system("stats", MemoryFs::new()).with_counter("FOO"),
                );
                let handle = Collector::spawn(&collector).unwrap();
                collector.wait_ready().unwrap();

                let mut producers = vec![];
                for _ in 0..NUM_THREADS {
                    let collector = Arc::clone(&collector);
                    producers.push(thread::spawn(move || {
                        for _ in 0..ITERATIONS_PER_THREAD {
                            collector.inc("FOO", 1).unwrap();
                        }
                    }));
                }
                for producer in producers {
                    producer.join().unwrap();
                }

                collector.finish().unwrap();
                handle.join().unwrap().unwrap();
                black_box(collector.value_of("FOO").unwrap())
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_inc_on_disk, bench_inc_in_memory);
criterion_main!(benches);

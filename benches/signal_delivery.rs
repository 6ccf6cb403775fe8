//! Benchmarks for publisher signal delivery
//!
//! This benchmark measures:
//! - Subscribe + synchronous single-shot completion on the inline queue
//! - Per-value overhead of `map`
//! - Cross-thread delivery through a serial queue

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fetch_publisher::publisher::AnyPublisher;
use fetch_publisher::CallbackQueue;
use std::sync::mpsc;

fn bench_single_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_shot");

    let publisher: AnyPublisher<u64, ()> =
        AnyPublisher::from_callback(CallbackQueue::inline(), |emitter| {
            emitter.emit(black_box(42), true);
            None
        });

    group.bench_function("subscribe_and_complete_inline", |b| {
        b.iter(|| {
            publisher.sink(|v| {
                black_box(v);
            }, |_| {})
        })
    });

    let mapped = publisher.clone().map(|v| v * 2);
    group.bench_function("subscribe_and_complete_mapped", |b| {
        b.iter(|| {
            mapped.sink(|v| {
                black_box(v);
            }, |_| {})
        })
    });

    group.finish();
}

fn bench_multi_emission(c: &mut Criterion) {
    const VALUES: u64 = 1_000;
    let mut group = c.benchmark_group("multi_emission");
    group.throughput(Throughput::Elements(VALUES));

    let publisher: AnyPublisher<u64, ()> =
        AnyPublisher::from_callback(CallbackQueue::inline(), |emitter| {
            for i in 0..VALUES {
                emitter.emit(i, i + 1 == VALUES);
            }
            None
        });
    group.bench_function("inline_1000_values", |b| {
        b.iter(|| {
            publisher.sink(|v| {
                black_box(v);
            }, |_| {})
        })
    });

    let queue = CallbackQueue::serial("bench.serial").expect("spawn bench queue");
    let publisher: AnyPublisher<u64, ()> = AnyPublisher::from_callback(queue, |emitter| {
        std::thread::spawn(move || {
            for i in 0..VALUES {
                emitter.emit(i, i + 1 == VALUES);
            }
        });
        None
    });
    group.bench_function("serial_queue_1000_values", |b| {
        b.iter(|| {
            let (tx, rx) = mpsc::channel();
            let _subscription = publisher.sink(
                |v| {
                    black_box(v);
                },
                move |done| {
                    let _ = tx.send(done);
                },
            );
            rx.recv().expect("completion")
        })
    });

    group.finish();
}

criterion_group!(benches, bench_single_shot, bench_multi_emission);
criterion_main!(benches);

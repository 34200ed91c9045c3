//! Performance benchmarks for observer-registry.
//!
//! - Broadcast cost as the number of listeners grows
//! - Copy-on-write registration cost
//! - Broadcast throughput while another thread keeps registering

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use observer_registry::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

fn counting_registry(listeners: usize) -> (NotificationRegistry<u64>, Arc<AtomicU64>) {
    let registry = NotificationRegistry::new();
    let total = Arc::new(AtomicU64::new(0));
    for _ in 0..listeners {
        let total = Arc::clone(&total);
        registry.register(infallible(move |value: &u64| {
            total.fetch_add(*value, Ordering::Relaxed);
        }));
    }
    (registry, total)
}

/// Benchmark broadcast latency for growing listener counts
fn benchmark_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    for listeners in [1usize, 10, 100, 1000] {
        let (registry, _total) = counting_registry(listeners);
        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| {
                b.iter(|| black_box(registry.broadcast(black_box(1)).unwrap()));
            },
        );
    }
    group.finish();
}

/// Benchmark register + unregister against an existing list
fn benchmark_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("register");
    for existing in [0usize, 100, 1000] {
        let (registry, _total) = counting_registry(existing);
        let listener: SharedListener<u64> = infallible(|_: &u64| {});
        group.bench_with_input(BenchmarkId::from_parameter(existing), &existing, |b, _| {
            b.iter(|| {
                registry.register(Arc::clone(&listener));
                black_box(registry.unregister(&listener));
            });
        });
    }
    group.finish();
}

/// Benchmark broadcasting while a writer churns registrations
fn benchmark_broadcast_under_churn(c: &mut Criterion) {
    let (registry, _total) = counting_registry(100);
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let registry = registry.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let listener: SharedListener<u64> = infallible(|_: &u64| {});
            while !stop.load(Ordering::Relaxed) {
                registry.register(Arc::clone(&listener));
                registry.unregister(&listener);
            }
        })
    };

    c.bench_function("broadcast_under_churn", |b| {
        b.iter(|| black_box(registry.broadcast(black_box(1)).unwrap()));
    });

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

criterion_group!(
    benches,
    benchmark_broadcast,
    benchmark_register,
    benchmark_broadcast_under_churn
);
criterion_main!(benches);

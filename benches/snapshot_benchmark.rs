#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmark for one sampling cycle's pure work: snapshot build, rate
//! derivation and per-process aggregation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kvmtop::aggregate::{aggregate_by_process, totals};
use kvmtop::rates::{compute_rates, RateContext};
use kvmtop::snapshot::Snapshot;
use kvmtop::{ThreadCounters, ThreadSample};
use std::hint::black_box;
use std::time::{Duration, Instant};

/// `size` threads spread over processes of 16 threads each.
fn threads(size: u32, step: u64) -> Vec<ThreadSample> {
    (0..size)
        .map(|i| {
            let tid = 1000 + i;
            let base = u64::from(i % 97) * step;
            ThreadSample {
                tid,
                tgid: 1000 + i / 16 * 16,
                counters: ThreadCounters {
                    cpu_ticks: base,
                    syscr: base * 3,
                    syscw: base * 2,
                    read_bytes: base * 4096,
                    write_bytes: base * 8192,
                    blkio_ticks: base / 10,
                    minflt: base,
                    majflt: base / 100,
                },
                command: format!("qemu-vm{}", i / 16),
                ..Default::default()
            }
        })
        .collect()
}

fn cycle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle");
    let ctx = RateContext::new(5.0, Duration::from_secs(5), 100);

    for size in [100u32, 1_000, 10_000] {
        let now = Instant::now();
        let previous = Snapshot::new(threads(size, 1), now);
        let current = threads(size, 2);

        group.bench_with_input(BenchmarkId::new("rates", size), &size, |b, _| {
            b.iter(|| {
                let mut snap = Snapshot::new(black_box(current.clone()), now);
                compute_rates(Some(&previous), &mut snap, &ctx);
                snap
            });
        });

        let mut derived = Snapshot::new(current.clone(), now);
        compute_rates(Some(&previous), &mut derived, &ctx);

        group.bench_with_input(BenchmarkId::new("aggregate", size), &size, |b, _| {
            b.iter(|| {
                let rows = aggregate_by_process(black_box(derived.entities()));
                totals(derived.entities(), &rows)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, cycle_benchmark);
criterion_main!(benches);

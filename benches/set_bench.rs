//! Set family operation benchmarks.
//!
//! Compares the three identity strategies on the same workloads. `SetEqual`
//! scans linearly, so its sizes stay small.

use collection::set::{HasEqual, HasHashCode, Set, SetEqual, SetHashCode};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const SIZES: [usize; 3] = [100, 1000, 10000];
const LINEAR_SIZES: [usize; 2] = [100, 1000];

#[derive(Clone)]
struct Key(usize);

impl HasEqual for Key {
    fn equal(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl HasHashCode for Key {
    fn hash_code(&self) -> String {
        self.0.to_string()
    }
}

fn benchmark_add_all(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_add_all");

    for size in SIZES {
        let values: Vec<usize> = (0..size).collect();
        group.bench_with_input(BenchmarkId::new("Set", size), &size, |bencher, _| {
            bencher.iter_batched(
                || values.clone(),
                |values| {
                    let set = Set::new();
                    set.add_all(values);
                    black_box(set)
                },
                BatchSize::SmallInput,
            );
        });

        let keys: Vec<Key> = values.iter().copied().map(Key).collect();
        group.bench_with_input(BenchmarkId::new("SetHashCode", size), &size, |bencher, _| {
            bencher.iter_batched(
                || keys.clone(),
                |keys| {
                    let set = SetHashCode::new();
                    set.add_all(keys);
                    black_box(set)
                },
                BatchSize::SmallInput,
            );
        });
    }

    for size in LINEAR_SIZES {
        let keys: Vec<Key> = (0..size).map(Key).collect();
        group.bench_with_input(BenchmarkId::new("SetEqual", size), &size, |bencher, _| {
            bencher.iter_batched(
                || keys.clone(),
                |keys| {
                    let set = SetEqual::new();
                    set.add_all(keys);
                    black_box(set)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_contains(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_contains");

    for size in SIZES {
        let set: Set<usize> = (0..size).collect();
        group.bench_with_input(BenchmarkId::new("Set", size), &size, |bencher, &size| {
            bencher.iter(|| black_box(set.contains(black_box(&(size / 2)))));
        });

        let hash_code: SetHashCode<Key> = (0..size).map(Key).collect();
        group.bench_with_input(BenchmarkId::new("SetHashCode", size), &size, |bencher, &size| {
            let probe = Key(size / 2);
            bencher.iter(|| black_box(hash_code.contains(black_box(&probe))));
        });
    }

    for size in LINEAR_SIZES {
        let equal: SetEqual<Key> = (0..size).map(Key).collect();
        group.bench_with_input(BenchmarkId::new("SetEqual", size), &size, |bencher, &size| {
            let probe = Key(size / 2);
            bencher.iter(|| black_box(equal.contains(black_box(&probe))));
        });
    }

    group.finish();
}

fn benchmark_display(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("set_display");

    for size in SIZES {
        let set: Set<usize> = (0..size).collect();
        group.bench_with_input(BenchmarkId::new("Set", size), &size, |bencher, _| {
            bencher.iter(|| black_box(set.to_string()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_add_all,
    benchmark_contains,
    benchmark_display
);
criterion_main!(benches);

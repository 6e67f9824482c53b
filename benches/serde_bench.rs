//! Benchmark for serde serialization/deserialization of the set types.
//!
//! Compares the sets against `std::collections::HashSet` and `Vec`.

use collection::set::{HasEqual, Set, SetEqual};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hint::black_box;

#[derive(Clone, Serialize, Deserialize)]
struct Record {
    id: u32,
}

impl HasEqual for Record {
    fn equal(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// =============================================================================
// Serialize
// =============================================================================

fn benchmark_serialize(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("serde_serialize_set");

    for size in [100, 1000, 10000] {
        let set: Set<u32> = (0..size).collect();
        let standard: HashSet<u32> = (0..size).collect();

        group.bench_with_input(BenchmarkId::new("Set", size), &size, |bencher, _| {
            bencher.iter(|| black_box(serde_json::to_string(&set).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("HashSet", size), &size, |bencher, _| {
            bencher.iter(|| black_box(serde_json::to_string(&standard).unwrap()));
        });
    }

    group.finish();
}

// =============================================================================
// Deserialize
// =============================================================================

fn benchmark_deserialize(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("serde_deserialize_set");

    for size in [100, 1000] {
        let values: Vec<u32> = (0..size).collect();
        let json = serde_json::to_string(&values).unwrap();
        let records: Vec<Record> = values.iter().map(|&id| Record { id }).collect();
        let records_json = serde_json::to_string(&records).unwrap();

        group.bench_with_input(BenchmarkId::new("Set", size), &json, |bencher, json| {
            bencher.iter(|| black_box(serde_json::from_str::<Set<u32>>(json).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("HashSet", size), &json, |bencher, json| {
            bencher.iter(|| black_box(serde_json::from_str::<HashSet<u32>>(json).unwrap()));
        });

        group.bench_with_input(
            BenchmarkId::new("SetEqual", size),
            &records_json,
            |bencher, json| {
                bencher.iter(|| black_box(serde_json::from_str::<SetEqual<Record>>(json).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_serialize, benchmark_deserialize);
criterion_main!(benches);

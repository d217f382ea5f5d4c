use std::{
    hint::black_box,
    rc::Rc,
};

use criterion::{
    BatchSize,
    BenchmarkId,
    Criterion,
    criterion_group,
    criterion_main,
};
use weakcache::WeakValueCache;

const RECORD_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];

/// Fixed-length keys, as a record store would use for its ids.
fn key(i: usize) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[8..].copy_from_slice(&(i as u64).to_be_bytes());
    key
}

fn records(n: usize) -> Vec<([u8; 16], Rc<u64>)> {
    (0..n).map(|i| (key(i), Rc::new(i as u64))).collect()
}

fn populated(records: &[([u8; 16], Rc<u64>)]) -> WeakValueCache<[u8; 16], u64> {
    let mut cache = WeakValueCache::with_capacity(records.len());
    for (key, value) in records {
        cache.insert(*key, value).unwrap();
    }
    cache
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for n in RECORD_COUNTS {
        let records = records(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| black_box(populated(&records)));
        });
    }
    group.finish();
}

fn bench_try_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_get");
    for n in RECORD_COUNTS {
        let records = records(n);
        let mut cache = populated(&records);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                for (key, _) in &records {
                    black_box(cache.try_get(key));
                }
            });
        });
    }
    group.finish();
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    for n in RECORD_COUNTS {
        let records = records(n);
        let mut cache = populated(&records);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                for entry in cache.entries() {
                    black_box(entry);
                }
            });
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    for n in RECORD_COUNTS {
        let records = records(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter_batched(
                || populated(&records),
                |mut cache| {
                    for (key, _) in &records {
                        black_box(cache.remove(key));
                    }
                    cache
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_purge_released(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_after_release");
    for n in RECORD_COUNTS {
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter_batched(
                || {
                    let records = records(n);
                    let cache = populated(&records);
                    let kept: Vec<_> = records.into_iter().step_by(2).collect();
                    (cache, kept)
                },
                |(mut cache, kept)| {
                    black_box(cache.count());
                    (cache, kept)
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_try_get,
    bench_enumerate,
    bench_remove,
    bench_purge_released
);
criterion_main!(benches);

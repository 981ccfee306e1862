//! Benchmarks for bigstore allocation and lookup

use criterion::{criterion_group, criterion_main, Criterion};

use bigstore::{Datastore, BLOCK_SIZE};
use tempfile::TempDir;

fn alloc_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    // Sparse bigfile, large enough to never hit OutOfSpace mid-run; only
    // the index does I/O here.
    Datastore::create(dir.path(), 1 << 38).unwrap();
    let store = Datastore::open(dir.path()).unwrap();

    let mut next_id = 0u64;
    c.bench_function("allocate_one_block", |b| {
        b.iter(|| {
            let key = format!("bench-{}", next_id);
            next_id += 1;
            store.allocate(key.as_bytes(), BLOCK_SIZE).unwrap()
        })
    });

    store.allocate(b"probe", 100).unwrap();
    c.bench_function("lookup_hit", |b| {
        b.iter(|| store.lookup(b"probe").unwrap())
    });

    c.bench_function("free_and_realloc", |b| {
        b.iter(|| {
            let key = format!("bench-churn-{}", next_id);
            next_id += 1;
            store.allocate(key.as_bytes(), BLOCK_SIZE).unwrap();
            store.free(key.as_bytes()).unwrap();
        })
    });
}

criterion_group!(benches, alloc_benchmarks);
criterion_main!(benches);

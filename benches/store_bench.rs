//! Benchmarks for dotkv store operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dotkv::{FileFormat, FileStore, ReloadPolicy, StorageBase, StoreConfig};
use tempfile::TempDir;

fn open_store(dir: &TempDir, name: &str, policy: ReloadPolicy, format: FileFormat) -> FileStore {
    let config = StoreConfig::builder()
        .reload_policy(policy)
        .format(format)
        .sync_on_write(false)
        .build();
    let store = FileStore::open(dir.path().join(name), config).unwrap();

    store
        .set_all((0..200).map(|i| (format!("section{}.key{}", i % 10, i), i)))
        .unwrap();
    store
}

fn store_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();

    let manual = open_store(&dir, "manual.ls", ReloadPolicy::Manual, FileFormat::Lightning);
    c.bench_function("get_int_manual_reload", |b| {
        b.iter(|| manual.get_int(black_box("section3.key13")).unwrap())
    });

    let always = open_store(&dir, "always.ls", ReloadPolicy::Always, FileFormat::Lightning);
    c.bench_function("get_int_always_reload", |b| {
        b.iter(|| always.get_int(black_box("section3.key13")).unwrap())
    });

    let on_change = open_store(&dir, "changed.ls", ReloadPolicy::OnChange, FileFormat::Lightning);
    c.bench_function("get_int_on_change_reload", |b| {
        b.iter(|| on_change.get_int(black_box("section3.key13")).unwrap())
    });

    let mut counter = 0i64;
    c.bench_function("set_write_through_lightning", |b| {
        b.iter(|| {
            counter += 1;
            manual.set("bench.counter", counter).unwrap()
        })
    });

    let binary = open_store(&dir, "manual.bin", ReloadPolicy::Manual, FileFormat::Binary);
    c.bench_function("set_write_through_binary", |b| {
        b.iter(|| {
            counter += 1;
            binary.set("bench.counter", counter).unwrap()
        })
    });

    c.bench_function("set_all_batched_50", |b| {
        b.iter(|| {
            counter += 1;
            manual
                .set_all((0..50).map(|i| (format!("batch.k{}", i), counter)))
                .unwrap()
        })
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);

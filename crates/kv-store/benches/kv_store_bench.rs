use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use kv_store::{InMemoryKeyValueStore, KeyValueStore, KeyValueStoreExt};

const TTL: Duration = Duration::from_secs(30);

fn bench_set_and_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryKeyValueStore::new();

    c.bench_function("kv_store/set_and_get", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.set("tcc:transaction:bench", "{}", TTL).await.unwrap();
                store.get("tcc:transaction:bench").await.unwrap();
            });
        });
    });
}

fn bench_lock_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryKeyValueStore::new();

    c.bench_function("kv_store/set_if_absent_then_compare_and_delete", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .set_if_absent("tcc:lock:bench", "holder", TTL)
                    .await
                    .unwrap();
                store
                    .compare_and_delete("tcc:lock:bench", "holder")
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_contended_set_if_absent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryKeyValueStore::new();
    rt.block_on(async {
        store.set("tcc:lock:held", "owner", TTL).await.unwrap();
    });

    c.bench_function("kv_store/set_if_absent_contended", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .set_if_absent("tcc:lock:held", "intruder", TTL)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_set_and_get,
    bench_lock_cycle,
    bench_contended_set_if_absent
);
criterion_main!(benches);

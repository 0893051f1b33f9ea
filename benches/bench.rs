use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use bounded_pool::{AccessMode, LoadingMode, Pool};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const CAPACITY: usize = 64;

fn new_pool(loading_mode: LoadingMode, access_mode: AccessMode) -> Pool<Vec<u8>> {
    Pool::new(CAPACITY, loading_mode, access_mode, |_| vec![0u8; 1024]).unwrap()
}

fn single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_release");
    for access_mode in [AccessMode::Fifo, AccessMode::Lifo, AccessMode::Circular] {
        let pool = new_pool(LoadingMode::Eager, access_mode);
        group.bench_function(BenchmarkId::from_parameter(format!("{access_mode:?}")), |b| {
            b.iter(|| {
                let mut item = pool.acquire().unwrap();
                item[0] = item[0].wrapping_add(1);
                black_box(&item);
            })
        });
    }
    group.finish();
}

fn held_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_all_release_all");
    for access_mode in [AccessMode::Fifo, AccessMode::Lifo, AccessMode::Circular] {
        let pool = new_pool(LoadingMode::Eager, access_mode);
        group.bench_function(BenchmarkId::from_parameter(format!("{access_mode:?}")), |b| {
            b.iter(|| {
                let items: Vec<_> = (0..CAPACITY).map(|_| pool.acquire().unwrap()).collect();
                black_box(items);
            })
        });
    }
    group.finish();
}

fn contended(c: &mut Criterion) {
    const THREADS: usize = 4;
    const ROUNDS: usize = 1000;

    let mut group = c.benchmark_group("contended");
    for loading_mode in [LoadingMode::Eager, LoadingMode::Lazy, LoadingMode::Hybrid] {
        group.bench_function(BenchmarkId::from_parameter(format!("{loading_mode:?}")), |b| {
            b.iter(|| {
                let pool = Arc::new(new_pool(loading_mode, AccessMode::Fifo));
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        let pool = pool.clone();
                        thread::spawn(move || {
                            for _ in 0..ROUNDS {
                                black_box(pool.acquire().unwrap());
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, single_thread, held_batch, contended);
criterion_main!(benches);

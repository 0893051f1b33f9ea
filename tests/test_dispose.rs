use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use bounded_pool::{AccessMode, Builder, Dispose, LoadingMode, Pool, PoolError};

#[derive(Debug)]
struct Socket {
    port: usize,
    closed: Arc<Mutex<Vec<usize>>>,
}

impl Dispose for Socket {
    fn dispose(self) {
        self.closed.lock().unwrap().push(self.port);
    }
}

fn socket_pool(
    capacity: usize,
    loading_mode: LoadingMode,
    access_mode: AccessMode,
) -> (Pool<Socket>, Arc<Mutex<Vec<usize>>>) {
    let closed = Arc::new(Mutex::new(Vec::new()));
    let next_port = AtomicUsize::new(8000);
    let sink = closed.clone();
    let pool = Builder::new()
        .capacity(capacity)
        .loading_mode(loading_mode)
        .access_mode(access_mode)
        .factory(move |_| Socket {
            port: next_port.fetch_add(1, Ordering::SeqCst),
            closed: sink.clone(),
        })
        .disposable()
        .build()
        .unwrap();
    (pool, closed)
}

#[test]
fn dispose_is_idempotent() {
    let (pool, closed) = socket_pool(2, LoadingMode::Eager, AccessMode::Fifo);
    assert!(!pool.is_disposed());
    pool.dispose();
    assert!(pool.is_disposed());
    pool.dispose();
    assert!(pool.is_disposed());
    assert_eq!(closed.lock().unwrap().len(), 2);
}

#[test]
fn concurrent_dispose_tears_down_once() {
    const CAPACITY: usize = 8;
    const THREADS: usize = 4;

    for _ in 0..200 {
        let disposed = Arc::new(AtomicUsize::new(0));
        let counter = disposed.clone();
        let pool = Arc::new(
            Builder::new()
                .capacity(CAPACITY)
                .loading_mode(LoadingMode::Eager)
                .access_mode(AccessMode::Circular)
                .factory(|_| 0u8)
                .dispose_with(move |_: u8| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap(),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = pool.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    pool.dispose();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(pool.is_disposed());
        assert_eq!(disposed.load(Ordering::SeqCst), CAPACITY);
        drop(pool);
        assert_eq!(disposed.load(Ordering::SeqCst), CAPACITY);
    }
}

#[test]
fn dispose_tears_down_every_stored_instance_once() {
    for access_mode in [AccessMode::Fifo, AccessMode::Lifo, AccessMode::Circular] {
        let (pool, closed) = socket_pool(4, LoadingMode::Eager, access_mode);
        pool.dispose();
        drop(pool);

        let mut ports = closed.lock().unwrap().clone();
        ports.sort_unstable();
        assert_eq!(ports, [8000, 8001, 8002, 8003], "{access_mode:?}");
    }
}

#[test]
fn dispose_skips_checked_out_instances() {
    let (pool, closed) = socket_pool(3, LoadingMode::Eager, AccessMode::Circular);
    let outstanding = pool.acquire().unwrap();
    let port = outstanding.port;

    pool.dispose();
    assert_eq!(closed.lock().unwrap().len(), 2);
    assert!(!closed.lock().unwrap().contains(&port));
    assert_eq!(pool.idle(), 0);

    // Released after dispose, the instance is dropped rather than stored.
    drop(outstanding);
    assert_eq!(pool.idle(), 0);
    assert_eq!(pool.in_use(), 0);
    assert_eq!(closed.lock().unwrap().len(), 2);
}

#[test]
fn dispose_on_drop() {
    let (pool, closed) = socket_pool(3, LoadingMode::Hybrid, AccessMode::Lifo);
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    drop((a, b));
    assert_eq!(pool.idle(), 2);

    drop(pool);
    assert_eq!(closed.lock().unwrap().len(), 2);
}

#[test]
fn dispose_lazy_pool_without_instances() {
    let (pool, closed) = socket_pool(3, LoadingMode::Lazy, AccessMode::Fifo);
    pool.dispose();
    assert!(closed.lock().unwrap().is_empty());
}

#[test]
fn acquire_after_dispose_fails() {
    let (pool, _) = socket_pool(2, LoadingMode::Eager, AccessMode::Fifo);
    pool.dispose();
    assert_eq!(pool.acquire().unwrap_err(), PoolError::Disposed);
    assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Disposed);
    assert_eq!(
        pool.acquire_timeout(Duration::from_millis(10)).unwrap_err(),
        PoolError::Disposed
    );

    let pool = Arc::new(pool);
    assert_eq!(pool.acquire_owned().unwrap_err(), PoolError::Disposed);
}

#[test]
fn dispose_does_not_hand_out_to_waiters() {
    let (pool, _) = socket_pool(1, LoadingMode::Eager, AccessMode::Fifo);
    let pool = Arc::new(pool);
    let held = pool.acquire_owned().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            pool.acquire_timeout(Duration::from_millis(200))
                .map(|entry| entry.port)
        })
    };
    thread::sleep(Duration::from_millis(50));
    pool.dispose();
    drop(held);

    let result = waiter.join().unwrap();
    assert!(
        matches!(result, Err(PoolError::Timeout(_) | PoolError::Disposed)),
        "{result:?}"
    );
}

#[test]
fn dispose_with_closure() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let counter = disposed.clone();
    let pool = Builder::new()
        .capacity(5)
        .loading_mode(LoadingMode::Eager)
        .factory(|_| String::from("buffer"))
        .dispose_with(move |item: String| {
            assert_eq!(item, "buffer");
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    drop(pool.acquire().unwrap());
    pool.dispose();
    assert_eq!(disposed.load(Ordering::SeqCst), 5);
}

#[test]
fn dispose_without_hook_drops_instances() {
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicUsize::new(0));
    let counter = dropped.clone();
    let pool = Pool::new(3, LoadingMode::Eager, AccessMode::Circular, move |_| {
        Tracked(counter.clone())
    })
    .unwrap();
    pool.dispose();
    assert_eq!(dropped.load(Ordering::SeqCst), 3);
    assert_eq!(pool.idle(), 0);
}

#[test]
fn panicking_hook_leaves_pool_closed() {
    let pool = Builder::new()
        .capacity(3)
        .loading_mode(LoadingMode::Eager)
        .factory(|_| 0u8)
        .dispose_with(|_: u8| panic!("teardown failed"))
        .build()
        .unwrap();
    let outstanding = pool.acquire().unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| pool.dispose()));
    assert!(result.is_err());
    assert!(pool.is_disposed());
    assert_eq!(pool.idle(), 0);

    drop(outstanding);
    assert_eq!(pool.idle(), 0);
    assert_eq!(pool.in_use(), 0);
    assert!(format!("{pool:?}").contains("available_permits: 0"));
    assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Disposed);
}

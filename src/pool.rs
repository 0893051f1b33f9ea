use std::fmt;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::Ordering::*;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::error::{PoolError, Result};
use crate::semaphore::{Permit, Semaphore};
use crate::slot::Instance;
use crate::store::{Store, new_store};
use crate::{AccessMode, Builder, Entry, LoadingMode, OwnedEntry};

pub(crate) type Factory<T> = dyn Fn(&Pool<T>) -> T + Send + Sync;
pub(crate) type DisposeFn<T> = dyn Fn(T) + Send + Sync;

/// Teardown for pooled types that hold resources needing more than `Drop`.
///
/// Select it with [`Builder::disposable`]. The pool calls it on every instance
/// resident in its store when the pool is disposed, and never on release.
pub trait Dispose {
    /// Tear the instance down.
    fn dispose(self);
}

/// A bounded, blocking object pool.
///
/// At most [`capacity`](Pool::capacity) instances are checked out at any
/// time; further acquirers block until an [`Entry`] is released. Instances are
/// built by the factory according to the [`LoadingMode`] and handed out again
/// in the order given by the [`AccessMode`].
///
/// # Examples
///
/// ```rust
/// use bounded_pool::{AccessMode, LoadingMode, Pool};
/// use std::sync::Arc;
///
/// let pool = Arc::new(
///     Pool::new(2, LoadingMode::Lazy, AccessMode::Fifo, |_| Vec::<u8>::new()).unwrap(),
/// );
///
/// let workers: Vec<_> = (0..4u8)
///     .map(|i| {
///         let pool = pool.clone();
///         std::thread::spawn(move || {
///             let mut buffer = pool.acquire().unwrap();
///             buffer.push(i);
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert!(pool.live() <= 2);
/// assert_eq!(pool.in_use(), 0);
/// ```
pub struct Pool<T: Send + 'static> {
    /// Configuration of the pool.
    config: Config,
    /// Builds new instances.
    factory: Box<Factory<T>>,
    /// Optional teardown for instances drained on dispose.
    dispose: Option<Box<DisposeFn<T>>>,
    /// Free instances.
    store: Mutex<Box<dyn Store<T>>>,
    /// One permit per instance that may be checked out.
    permits: Semaphore,
    /// Number of instances constructed, or reserved for construction.
    live: AtomicUsize,
    /// Number of instances currently checked out.
    checked_out: AtomicUsize,
    /// Identity handed to the next constructed instance.
    next_id: AtomicUsize,
    disposed: AtomicBool,
}

impl<T: Send + 'static> Pool<T> {
    /// Create a pool of `capacity` instances built by `factory`.
    ///
    /// With [`LoadingMode::Eager`] the factory runs `capacity` times before
    /// this returns.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool, PoolError};
    ///
    /// let pool = Pool::new(3, LoadingMode::Eager, AccessMode::Lifo, |_| String::new()).unwrap();
    /// assert_eq!(pool.idle(), 3);
    ///
    /// let err = Pool::new(0, LoadingMode::Eager, AccessMode::Lifo, |_| String::new())
    ///     .unwrap_err();
    /// assert_eq!(err, PoolError::InvalidCapacity(0));
    /// ```
    pub fn new<F>(
        capacity: usize,
        loading_mode: LoadingMode,
        access_mode: AccessMode,
        factory: F,
    ) -> Result<Self>
    where
        F: Fn(&Pool<T>) -> T + Send + Sync + 'static,
    {
        Self::with_config(
            Config {
                capacity,
                loading_mode,
                access_mode,
            },
            factory,
        )
    }

    /// Create a pool from a [`Config`].
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] if the configured capacity is zero.
    pub fn with_config<F>(config: Config, factory: F) -> Result<Self>
    where
        F: Fn(&Pool<T>) -> T + Send + Sync + 'static,
    {
        Self::from_parts(config, Box::new(factory), None)
    }

    /// Start configuring a pool.
    pub fn builder() -> Builder<T> {
        Builder::new()
    }

    pub(crate) fn from_parts(
        config: Config,
        factory: Box<Factory<T>>,
        dispose: Option<Box<DisposeFn<T>>>,
    ) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            store: Mutex::new(new_store(config.access_mode, config.capacity)),
            permits: Semaphore::new(config.capacity),
            live: AtomicUsize::new(0),
            checked_out: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            factory,
            dispose,
            config,
        };
        debug!(
            capacity = pool.config.capacity,
            loading_mode = ?pool.config.loading_mode,
            access_mode = ?pool.config.access_mode,
            "creating pool"
        );

        if pool.config.loading_mode == LoadingMode::Eager {
            pool.preload()?;
        }
        Ok(pool)
    }

    /// Fill the store with `capacity` fresh instances.
    fn preload(&self) -> Result<()> {
        for _ in 0..self.config.capacity {
            let instance = self.construct();
            self.store.lock().add(instance)?;
        }
        self.live.store(self.config.capacity, Release);
        debug!(count = self.config.capacity, "preloaded pool");
        Ok(())
    }

    /// Get the capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get the loading mode of the pool.
    pub fn loading_mode(&self) -> LoadingMode {
        self.config.loading_mode
    }

    /// Get the access mode of the pool.
    pub fn access_mode(&self) -> AccessMode {
        self.config.access_mode
    }

    /// Get the configuration the pool was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of instances resident in the store, free to be handed out.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool};
    ///
    /// let pool = Pool::new(2, LoadingMode::Eager, AccessMode::Fifo, |_| 0u32).unwrap();
    /// assert_eq!(pool.idle(), 2);
    /// let item = pool.acquire().unwrap();
    /// assert_eq!(pool.idle(), 1);
    /// drop(item);
    /// assert_eq!(pool.idle(), 2);
    /// ```
    pub fn idle(&self) -> usize {
        self.store.lock().len()
    }

    /// Number of instances constructed so far.
    pub fn live(&self) -> usize {
        self.live.load(Acquire)
    }

    /// Number of instances currently checked out.
    pub fn in_use(&self) -> usize {
        self.checked_out.load(Acquire)
    }

    /// Whether [`dispose`](Pool::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Acquire)
    }

    /// Acquire an instance, blocking for as long as every instance is checked out.
    ///
    /// There is no timeout: a thread that already holds an entry and acquires
    /// again from an exhausted pool deadlocks.
    ///
    /// # Errors
    ///
    /// [`PoolError::Disposed`] if the pool was disposed before the call. An
    /// invariant error if the store's bookkeeping is broken.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool};
    ///
    /// let pool = Pool::new(1, LoadingMode::Lazy, AccessMode::Fifo, |_| 0u32).unwrap();
    /// let mut item = pool.acquire().unwrap();
    /// *item += 1;
    /// drop(item);
    /// assert_eq!(*pool.acquire().unwrap(), 1);
    /// ```
    pub fn acquire(&self) -> Result<Entry<'_, T>> {
        self.ensure_open()?;
        let permit = self.permits.acquire();
        self.checkout(permit)
            .map(|instance| Entry::new(self, instance))
    }

    /// Acquire an instance without blocking.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] if every instance is checked out, otherwise as
    /// for [`acquire`](Pool::acquire).
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool, PoolError};
    ///
    /// let pool = Pool::new(1, LoadingMode::Hybrid, AccessMode::Fifo, |_| 0u32).unwrap();
    /// let item = pool.try_acquire().unwrap();
    /// assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Exhausted);
    /// drop(item);
    /// assert!(pool.try_acquire().is_ok());
    /// ```
    pub fn try_acquire(&self) -> Result<Entry<'_, T>> {
        self.ensure_open()?;
        let permit = self.permits.try_acquire().ok_or(PoolError::Exhausted)?;
        self.checkout(permit)
            .map(|instance| Entry::new(self, instance))
    }

    /// Acquire an instance, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] if no instance was released in time, otherwise
    /// as for [`acquire`](Pool::acquire).
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Entry<'_, T>> {
        self.ensure_open()?;
        let permit = self
            .permits
            .acquire_timeout(timeout)
            .ok_or(PoolError::Timeout(timeout))?;
        self.checkout(permit)
            .map(|instance| Entry::new(self, instance))
    }

    /// Acquire an owned instance, blocking like [`acquire`](Pool::acquire).
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool};
    /// use std::sync::Arc;
    ///
    /// let pool =
    ///     Arc::new(Pool::new(2, LoadingMode::Eager, AccessMode::Circular, |_| 0u32).unwrap());
    /// let item = pool.acquire_owned().unwrap();
    /// let handle = std::thread::spawn(move || *item + 1);
    /// assert_eq!(handle.join().unwrap(), 1);
    /// assert_eq!(pool.idle(), 2);
    /// ```
    pub fn acquire_owned(self: &Arc<Self>) -> Result<OwnedEntry<T>> {
        self.ensure_open()?;
        let permit = self.permits.acquire();
        self.checkout(permit)
            .map(|instance| OwnedEntry::new(self.clone(), instance))
    }

    /// Acquire an owned instance without blocking.
    ///
    /// # Errors
    ///
    /// As for [`try_acquire`](Pool::try_acquire).
    pub fn try_acquire_owned(self: &Arc<Self>) -> Result<OwnedEntry<T>> {
        self.ensure_open()?;
        let permit = self.permits.try_acquire().ok_or(PoolError::Exhausted)?;
        self.checkout(permit)
            .map(|instance| OwnedEntry::new(self.clone(), instance))
    }

    /// Return an entry to the pool.
    ///
    /// Dropping the entry does the same; this form reports failures.
    ///
    /// # Errors
    ///
    /// [`PoolError::ForeignInstance`] if `entry` came from another pool. The
    /// entry then goes back to its own pool as it is dropped.
    pub fn release(&self, entry: Entry<'_, T>) -> Result<()> {
        if !ptr::eq(entry.pool(), self) {
            return Err(PoolError::ForeignInstance);
        }
        entry.release()
    }

    /// Return an owned entry to the pool.
    ///
    /// # Errors
    ///
    /// As for [`release`](Pool::release).
    pub fn release_owned(&self, entry: OwnedEntry<T>) -> Result<()> {
        if !ptr::eq(entry.pool(), self) {
            return Err(PoolError::ForeignInstance);
        }
        entry.release()
    }

    /// Dispose of the pool.
    ///
    /// Drains the store and tears down every instance in it with the dispose
    /// hook, or drops it when no hook is set. The pool is closed before any
    /// instance is torn down. Instances checked out at this point are not
    /// torn down; when released they are dropped instead of stored. Threads
    /// already blocked in [`acquire`](Pool::acquire) are not woken and stay
    /// blocked.
    ///
    /// Calling it more than once does nothing.
    pub fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, AcqRel, Acquire)
            .is_err()
        {
            return;
        }

        let drained = {
            let mut store = self.store.lock();
            let mut drained = Vec::with_capacity(store.len());
            while !store.is_empty() {
                match store.fetch() {
                    Ok(instance) => drained.push(instance),
                    Err(err) => {
                        error!(%err, "failed to drain store during dispose");
                        break;
                    }
                }
            }
            drained
        };
        self.permits.close();

        debug!(
            drained = drained.len(),
            outstanding = self.in_use(),
            "disposing pool"
        );
        for instance in drained {
            match &self.dispose {
                Some(dispose) => dispose(instance.value),
                None => drop(instance),
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(PoolError::Disposed);
        }
        Ok(())
    }

    /// Turn a permit into a checked-out instance.
    ///
    /// The permit goes back to the semaphore if this fails or unwinds.
    fn checkout(&self, permit: Permit<'_>) -> Result<Instance<T>> {
        let instance = match self.config.loading_mode {
            LoadingMode::Eager => self.fetch_stored()?,
            LoadingMode::Lazy => self.acquire_lazy()?,
            LoadingMode::Hybrid => self.acquire_hybrid()?,
        };
        permit.forget();
        self.checked_out.fetch_add(1, AcqRel);
        Ok(instance)
    }

    /// Take an instance from the store, which must not be empty.
    fn fetch_stored(&self) -> Result<Instance<T>> {
        let mut store = self.store.lock();
        if self.is_disposed() {
            return Err(PoolError::Disposed);
        }
        let instance = store.fetch().inspect_err(|err| {
            error!(%err, free = store.len(), "no stored instance for a held permit");
        })?;
        trace!(id = instance.id, "fetched stored instance");
        Ok(instance)
    }

    fn acquire_lazy(&self) -> Result<Instance<T>> {
        {
            let mut store = self.store.lock();
            if self.is_disposed() {
                return Err(PoolError::Disposed);
            }
            if !store.is_empty() {
                let instance = store.fetch().inspect_err(|err| {
                    error!(%err, "store reported free instances but fetch failed");
                })?;
                trace!(id = instance.id, "fetched stored instance");
                return Ok(instance);
            }
        }

        self.live.fetch_add(1, AcqRel);
        let reservation = Reservation::new(&self.live);
        let instance = self.construct();
        reservation.commit();
        Ok(instance)
    }

    fn acquire_hybrid(&self) -> Result<Instance<T>> {
        let capacity = self.config.capacity;
        if self.live.load(Acquire) < capacity {
            let count = self.live.fetch_add(1, AcqRel) + 1;
            let reservation = Reservation::new(&self.live);
            if count <= capacity {
                let instance = self.construct();
                reservation.commit();
                return Ok(instance);
            }
            // Another acquirer took the last construction slot; the store
            // has an instance for our permit.
            drop(reservation);
        }
        self.fetch_stored()
    }

    fn construct(&self) -> Instance<T> {
        let id = self.next_id.fetch_add(1, Relaxed);
        trace!(id, "constructing instance");
        Instance::new(id, (self.factory)(self))
    }

    /// Put a released instance back into the store and free its permit.
    pub(crate) fn recycle(&self, instance: Instance<T>) -> Result<()> {
        let mut store = self.store.lock();
        self.checked_out.fetch_sub(1, AcqRel);
        if self.is_disposed() {
            drop(store);
            trace!(id = instance.id, "dropping instance released after dispose");
            return Ok(());
        }
        let id = instance.id;
        let result = store.add(instance);
        drop(store);
        self.permits.release();
        trace!(id, "released instance");
        result
    }
}

impl<T: Send + 'static> Drop for Pool<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Send + 'static> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .field("idle", &self.idle())
            .field("live", &self.live())
            .field("in_use", &self.in_use())
            .field("available_permits", &self.permits.available_permits())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// One unit of the live counter, taken back unless committed.
struct Reservation<'a> {
    live: &'a AtomicUsize,
}

impl<'a> Reservation<'a> {
    fn new(live: &'a AtomicUsize) -> Self {
        Self { live }
    }

    fn commit(self) {
        std::mem::forget(self);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, AcqRel);
    }
}

/// Configuration for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum number of instances checked out at once.
    pub capacity: usize,
    /// When instances are constructed.
    pub loading_mode: LoadingMode,
    /// Order in which free instances are reused.
    pub access_mode: AccessMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 16,
            loading_mode: LoadingMode::default(),
            access_mode: AccessMode::default(),
        }
    }
}

impl Config {
    /// Check that the configuration can build a pool.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] if `capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

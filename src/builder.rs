use std::fmt;

use crate::error::{PoolError, Result};
use crate::pool::{DisposeFn, Factory};
use crate::{AccessMode, Config, Dispose, LoadingMode, Pool};

/// A builder for creating a [`Pool`] with custom configuration.
///
/// # Example
///
/// ```rust
/// use bounded_pool::{AccessMode, Builder, LoadingMode};
///
/// let mut builder = Builder::new();
/// let pool = builder
///     .capacity(4)
///     .loading_mode(LoadingMode::Lazy)
///     .access_mode(AccessMode::Circular)
///     .factory(|pool| Vec::<u8>::with_capacity(pool.capacity()))
///     .build()
///     .unwrap();
/// assert_eq!(pool.capacity(), 4);
/// assert_eq!(pool.live(), 0);
/// ```
pub struct Builder<T: Send + 'static> {
    /// Configuration of the pool.
    config: Config,
    factory: Option<Box<Factory<T>>>,
    dispose: Option<Box<DisposeFn<T>>>,
}

impl<T: Send + 'static> Builder<T> {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            factory: None,
            dispose: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Set the maximum number of instances checked out at once.
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.config.capacity = capacity;
        self
    }

    /// Set when instances are constructed.
    pub fn loading_mode(&mut self, mode: LoadingMode) -> &mut Self {
        self.config.loading_mode = mode;
        self
    }

    /// Set the order in which free instances are reused.
    pub fn access_mode(&mut self, mode: AccessMode) -> &mut Self {
        self.config.access_mode = mode;
        self
    }

    /// Set the function constructing new instances.
    ///
    /// It receives the pool being built, so it can read its configuration.
    pub fn factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(&Pool<T>) -> T + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Set the function tearing down instances drained when the pool is disposed.
    pub fn dispose_with<F>(&mut self, dispose: F) -> &mut Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.dispose = Some(Box::new(dispose));
        self
    }

    /// Build the pool with the current configuration.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] if the capacity is zero,
    /// [`PoolError::MissingFactory`] if no factory was set.
    pub fn build(&mut self) -> Result<Pool<T>> {
        self.config.validate()?;
        let factory = self.factory.take().ok_or(PoolError::MissingFactory)?;
        let config = std::mem::take(&mut self.config);
        Pool::from_parts(config, factory, self.dispose.take())
    }
}

impl<T: Dispose + Send + 'static> Builder<T> {
    /// Tear instances down with [`Dispose::dispose`] when the pool is disposed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{Builder, Dispose, LoadingMode};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// struct Connection(Arc<AtomicUsize>);
    ///
    /// impl Dispose for Connection {
    ///     fn dispose(self) {
    ///         self.0.fetch_add(1, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// let closed = Arc::new(AtomicUsize::new(0));
    /// let counter = closed.clone();
    /// let pool = Builder::new()
    ///     .capacity(3)
    ///     .loading_mode(LoadingMode::Eager)
    ///     .factory(move |_| Connection(counter.clone()))
    ///     .disposable()
    ///     .build()
    ///     .unwrap();
    /// pool.dispose();
    /// assert_eq!(closed.load(Ordering::SeqCst), 3);
    /// ```
    pub fn disposable(&mut self) -> &mut Self {
        self.dispose_with(T::dispose)
    }
}

impl<T: Send + 'static> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("config", &self.config)
            .field("has_factory", &self.factory.is_some())
            .field("has_dispose", &self.dispose.is_some())
            .finish()
    }
}

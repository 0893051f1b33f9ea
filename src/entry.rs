use std::fmt::{self, Debug};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::warn;

use crate::Pool;
use crate::error::Result;
use crate::slot::Instance;

/// An instance checked out of a [`Pool`].
///
/// `Entry` owns the instance and borrows the pool. Dropping it releases the
/// instance back to the pool.
pub struct Entry<'a, T: Send + 'static> {
    // `instance` is always `Some` until the entry is released.
    instance: Option<Instance<T>>,
    pool: &'a Pool<T>,
}

impl<'a, T: Send + 'static> Entry<'a, T> {
    pub(crate) fn new(pool: &'a Pool<T>, instance: Instance<T>) -> Self {
        Self {
            instance: Some(instance),
            pool,
        }
    }

    /// Identity the pool assigned to the instance when it was constructed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bounded_pool::{AccessMode, LoadingMode, Pool};
    ///
    /// let pool = Pool::new(2, LoadingMode::Eager, AccessMode::Fifo, |_| ()).unwrap();
    /// let first = pool.acquire().unwrap();
    /// let second = pool.acquire().unwrap();
    /// assert_ne!(first.id(), second.id());
    /// ```
    pub fn id(&self) -> usize {
        self.instance().id
    }

    /// Get reference to the inner item.
    pub fn get(&self) -> &T {
        &self.instance().value
    }

    /// Get mutable reference to the inner item.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.instance_mut().value
    }

    /// The pool this entry was acquired from.
    pub fn pool(&self) -> &'a Pool<T> {
        self.pool
    }

    /// Release the instance back to its pool, reporting store failures.
    ///
    /// # Errors
    ///
    /// An invariant error if the store cannot take the instance back. The
    /// permit is freed either way.
    pub fn release(mut self) -> Result<()> {
        match self.instance.take() {
            Some(instance) => self.pool.recycle(instance),
            None => Ok(()),
        }
    }

    fn instance(&self) -> &Instance<T> {
        self.instance
            .as_ref()
            .expect("entry accessed after release")
    }

    fn instance_mut(&mut self) -> &mut Instance<T> {
        self.instance
            .as_mut()
            .expect("entry accessed after release")
    }
}

impl<T: Send + 'static> Drop for Entry<'_, T> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            if let Err(err) = self.pool.recycle(instance) {
                warn!(%err, "failed to release pooled instance");
            }
        }
    }
}

impl<T: Send + 'static> Deref for Entry<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Send + 'static> DerefMut for Entry<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<T: Send + Debug + 'static> Debug for Entry<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id())
            .field("value", self.get())
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<T: Send + serde::Serialize + 'static> serde::Serialize for Entry<'_, T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.get().serialize(serializer)
    }
}

/// An owned instance checked out of a [`Pool`].
///
/// `OwnedEntry` holds an `Arc` reference to the pool, so it can move across
/// threads freely. Dropping it releases the instance back to the pool.
pub struct OwnedEntry<T: Send + 'static> {
    // `instance` is always `Some` until the entry is released.
    instance: Option<Instance<T>>,
    pool: Arc<Pool<T>>,
}

impl<T: Send + 'static> OwnedEntry<T> {
    pub(crate) fn new(pool: Arc<Pool<T>>, instance: Instance<T>) -> Self {
        Self {
            instance: Some(instance),
            pool,
        }
    }

    /// Identity the pool assigned to the instance when it was constructed.
    pub fn id(&self) -> usize {
        self.instance().id
    }

    /// Get reference to the inner item.
    pub fn get(&self) -> &T {
        &self.instance().value
    }

    /// Get mutable reference to the inner item.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.instance_mut().value
    }

    /// The pool this entry was acquired from.
    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }

    /// Release the instance back to its pool, reporting store failures.
    ///
    /// # Errors
    ///
    /// As for [`Entry::release`].
    pub fn release(mut self) -> Result<()> {
        match self.instance.take() {
            Some(instance) => self.pool.recycle(instance),
            None => Ok(()),
        }
    }

    fn instance(&self) -> &Instance<T> {
        self.instance
            .as_ref()
            .expect("entry accessed after release")
    }

    fn instance_mut(&mut self) -> &mut Instance<T> {
        self.instance
            .as_mut()
            .expect("entry accessed after release")
    }
}

impl<T: Send + 'static> Drop for OwnedEntry<T> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            if let Err(err) = self.pool.recycle(instance) {
                warn!(%err, "failed to release pooled instance");
            }
        }
    }
}

impl<T: Send + 'static> Deref for OwnedEntry<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Send + 'static> DerefMut for OwnedEntry<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<T: Send + Debug + 'static> Debug for OwnedEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedEntry")
            .field("id", &self.id())
            .field("value", self.get())
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<T: Send + serde::Serialize + 'static> serde::Serialize for OwnedEntry<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.get().serialize(serializer)
    }
}

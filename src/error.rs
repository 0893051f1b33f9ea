use std::time::Duration;

use thiserror::Error;

/// Result type returned by pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors produced while building or using a [`Pool`](crate::Pool).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool was configured with a capacity of zero.
    #[error("pool capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// No factory was supplied to the builder.
    #[error("pool factory is missing")]
    MissingFactory,

    /// A fetch was attempted on a store with no free instances.
    #[error("the store is empty")]
    EmptyStore,

    /// The circular store scanned every slot without finding a free one
    /// although its free count was positive.
    #[error("no free slot found in a full rotation ({free} free of {slots} slots)")]
    NoFreeSlot {
        /// Free count reported by the store.
        free: usize,
        /// Number of slots scanned.
        slots: usize,
    },

    /// An instance was added to a store that already holds `capacity` instances.
    #[error("store already holds {capacity} instances")]
    StoreOverflow {
        /// Capacity of the pool owning the store.
        capacity: usize,
    },

    /// The pool has been disposed.
    #[error("the pool has been disposed")]
    Disposed,

    /// An entry was released to a pool it was not acquired from.
    #[error("the entry was not acquired from this pool")]
    ForeignInstance,

    /// No permit was free for a non-blocking acquire.
    #[error("all instances are checked out")]
    Exhausted,

    /// No permit became free before the deadline.
    #[error("timed out after {0:?} waiting for an instance")]
    Timeout(Duration),
}

impl PoolError {
    /// Whether the error indicates broken internal bookkeeping rather than
    /// misuse or contention.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::EmptyStore | Self::NoFreeSlot { .. } | Self::StoreOverflow { .. }
        )
    }
}

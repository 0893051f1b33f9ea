//! A bounded, blocking object pool.
//!
//! # Features
//!
//! - At most `capacity` instances are checked out at once; acquirers beyond
//!   that block until an instance is released.
//! - Configurable loading: build every instance upfront ([`LoadingMode::Eager`]),
//!   on demand when none is free ([`LoadingMode::Lazy`]), or on demand until
//!   capacity is reached ([`LoadingMode::Hybrid`]).
//! - Configurable reuse order: [`AccessMode::Fifo`], [`AccessMode::Lifo`] or
//!   round-robin with [`AccessMode::Circular`].
//! - Thread-safe: multiple threads acquire and release concurrently.
//! - Instances resident in the pool are torn down on [`Pool::dispose`].
//!
//! # Examples
//!
//! ## Local object pool
//!
//! ```rust
//! use bounded_pool::{AccessMode, LoadingMode, Pool};
//!
//! let pool = Pool::new(2, LoadingMode::Eager, AccessMode::Fifo, |_| String::new()).unwrap();
//! assert_eq!(pool.idle(), 2);
//! let mut item = pool.acquire().unwrap();
//! item.push_str("hello");
//! assert_eq!(pool.idle(), 1);
//! assert_eq!(pool.in_use(), 1);
//! drop(item);
//! assert_eq!(pool.idle(), 2);
//! ```
//!
//! ## Multiple threads sharing a pool
//!
//! ```rust
//! use bounded_pool::{AccessMode, Builder, LoadingMode};
//! use std::sync::{Arc, mpsc};
//!
//! let pool = Arc::new(
//!     Builder::new()
//!         .capacity(2)
//!         .loading_mode(LoadingMode::Hybrid)
//!         .access_mode(AccessMode::Circular)
//!         .factory(|_| 0u32)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let (tx, rx) = mpsc::channel();
//! let senders: Vec<_> = (1..=2u32)
//!     .map(|id| {
//!         let pool = pool.clone();
//!         let tx = tx.clone();
//!         std::thread::spawn(move || {
//!             let mut item = pool.acquire_owned().unwrap();
//!             *item = id;
//!             tx.send(item).unwrap();
//!         })
//!     })
//!     .collect();
//! drop(tx);
//!
//! let mut seen: Vec<u32> = rx.iter().map(|item| *item).collect();
//! seen.sort();
//! assert_eq!(seen, [1, 2]);
//!
//! for sender in senders {
//!     sender.join().unwrap();
//! }
//! assert_eq!(pool.live(), 2);
//! ```

mod builder;
mod entry;
mod error;
mod mode;
mod pool;
mod semaphore;
mod slot;
mod store;

pub use builder::Builder;
pub use entry::{Entry, OwnedEntry};
pub use error::{PoolError, Result};
pub use mode::{AccessMode, LoadingMode};
pub use pool::{Config, Dispose, Pool};

use crossbeam_queue::ArrayQueue;

use crate::AccessMode;
use crate::error::{PoolError, Result};
use crate::slot::{Instance, Slot};

/// Container of the instances that are currently free.
///
/// A store is not synchronized on its own; the owning pool serializes every
/// call behind a single lock.
pub(crate) trait Store<T>: Send {
    /// Remove a free instance according to the ordering policy.
    fn fetch(&mut self) -> Result<Instance<T>>;

    /// Return an instance to the store.
    fn add(&mut self, instance: Instance<T>) -> Result<()>;

    /// Number of free instances.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create the store implementing `mode`, sized for `capacity` instances.
pub(crate) fn new_store<T: Send + 'static>(
    mode: AccessMode,
    capacity: usize,
) -> Box<dyn Store<T>> {
    match mode {
        AccessMode::Fifo => Box::new(QueueStore::new(capacity)),
        AccessMode::Lifo => Box::new(StackStore::new(capacity)),
        AccessMode::Circular => Box::new(CircularStore::new(capacity)),
    }
}

/// Hands out the least recently added instance.
pub(crate) struct QueueStore<T> {
    queue: ArrayQueue<Instance<T>>,
}

impl<T> QueueStore<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
        }
    }
}

impl<T: Send> Store<T> for QueueStore<T> {
    fn fetch(&mut self) -> Result<Instance<T>> {
        self.queue.pop().ok_or(PoolError::EmptyStore)
    }

    fn add(&mut self, instance: Instance<T>) -> Result<()> {
        self.queue.push(instance).map_err(|_| PoolError::StoreOverflow {
            capacity: self.queue.capacity(),
        })
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Hands out the most recently added instance.
pub(crate) struct StackStore<T> {
    stack: Vec<Instance<T>>,
    capacity: usize,
}

impl<T> StackStore<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
            capacity,
        }
    }
}

impl<T: Send> Store<T> for StackStore<T> {
    fn fetch(&mut self) -> Result<Instance<T>> {
        self.stack.pop().ok_or(PoolError::EmptyStore)
    }

    fn add(&mut self, instance: Instance<T>) -> Result<()> {
        if self.stack.len() >= self.capacity {
            return Err(PoolError::StoreOverflow {
                capacity: self.capacity,
            });
        }
        self.stack.push(instance);
        Ok(())
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

/// Hands out instances round-robin.
///
/// Every instance the store has ever received keeps its slot; fetching scans
/// forward from the slot after the last one handed out, wrapping around.
pub(crate) struct CircularStore<T> {
    slots: Vec<Slot<T>>,
    capacity: usize,
    free: usize,
    // Index the next scan starts from.
    cursor: usize,
}

impl<T> CircularStore<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            free: 0,
            cursor: 0,
        }
    }

    fn slot_of(&self, id: usize) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id() == id)
    }
}

impl<T: Send> Store<T> for CircularStore<T> {
    fn fetch(&mut self) -> Result<Instance<T>> {
        if self.free == 0 {
            return Err(PoolError::EmptyStore);
        }

        let len = self.slots.len();
        for step in 0..len {
            let index = (self.cursor + step) % len;
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            if let Some(instance) = slot.take() {
                self.free -= 1;
                self.cursor = (index + 1) % len;
                return Ok(instance);
            }
        }

        Err(PoolError::NoFreeSlot {
            free: self.free,
            slots: len,
        })
    }

    fn add(&mut self, instance: Instance<T>) -> Result<()> {
        match self.slot_of(instance.id) {
            Some(index) => {
                let slot = &mut self.slots[index];
                if slot.put(instance.value).is_none() {
                    self.free += 1;
                }
            }
            None => {
                if self.slots.len() >= self.capacity {
                    return Err(PoolError::StoreOverflow {
                        capacity: self.capacity,
                    });
                }
                self.slots.push(Slot::new(instance));
                self.free += 1;
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.free
    }
}

impl<T> CircularStore<T> {
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    fn in_use(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_in_use()).count()
    }
}

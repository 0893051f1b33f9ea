/// A pooled value tagged with the identity the pool assigned on construction.
#[derive(Debug)]
pub(crate) struct Instance<T> {
    pub(crate) id: usize,
    pub(crate) value: T,
}

impl<T> Instance<T> {
    pub(crate) fn new(id: usize, value: T) -> Self {
        Self { id, value }
    }
}

/// Binding between one instance identity and its value for the circular store.
///
/// The value is parked here while the instance is free and taken out while it
/// is checked out, so a slot is in use exactly when it holds no value. A slot
/// is never removed once created.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    id: usize,
    item: Option<T>,
}

impl<T> Slot<T> {
    /// Create a free slot holding `instance`.
    pub(crate) fn new(instance: Instance<T>) -> Self {
        Self {
            id: instance.id,
            item: Some(instance.value),
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn is_in_use(&self) -> bool {
        self.item.is_none()
    }

    /// Mark the slot in use and hand out its value.
    pub(crate) fn take(&mut self) -> Option<Instance<T>> {
        self.item.take().map(|value| Instance::new(self.id, value))
    }

    /// Park `value` in the slot and mark it free.
    ///
    /// Returns the previous value if the slot was already free.
    pub(crate) fn put(&mut self, value: T) -> Option<T> {
        self.item.replace(value)
    }
}

/// When instances of the pooled type are constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoadingMode {
    /// Every instance is constructed while the pool is built.
    Eager,
    /// Instances are constructed on acquire, only when the store has none free.
    Lazy,
    /// Acquirers race to construct until capacity is reached, then reuse.
    #[default]
    Hybrid,
}

/// The order in which free instances are handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AccessMode {
    /// First in, first out.
    #[default]
    Fifo,
    /// Last in, first out.
    Lifo,
    /// Round-robin over every instance the pool has seen.
    Circular,
}

//! Device identity

/// A compute unit a runtime can place buffers on
pub trait Device: Clone + Send + Sync + 'static {
    /// Index of the device within its runtime (always 0 for the CPU)
    fn id(&self) -> usize;

    /// Display name such as `cpu` or `cuda:1`
    fn name(&self) -> String;
}

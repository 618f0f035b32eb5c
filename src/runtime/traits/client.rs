//! Per-device operation dispatcher

use super::Runtime;

/// Handle through which operations run on one device
///
/// Operation traits such as [`SplitOps`](crate::ops::SplitOps) are implemented
/// on clients. A client owns whatever execution state its backend needs: a
/// rayon pool for the CPU, a context and stream for CUDA.
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Device this client launches work on
    fn device(&self) -> &R::Device;

    /// Block until all work queued through this client has finished
    fn synchronize(&self);

    /// Allocator bound to this client's device
    fn allocator(&self) -> &R::Allocator;
}

//! Backends and the pieces shared between them
//!
//! ```text
//! Runtime (memory model, static dispatch)
//! ├── Device     which CPU / GPU
//! ├── Client     runs operations; owns the rayon pool or CUDA stream
//! └── Allocator  client-bound allocation
//!
//! split_ops      validation, geometry and fast paths for every backend
//! deferred       host buffers released from a device callback
//! ```

mod allocator;
mod deferred;
pub mod helpers;
pub mod split_ops;
mod traits;

#[cfg(feature = "cpu")]
pub mod cpu;

#[cfg(feature = "cuda")]
pub mod cuda;

pub use allocator::{Allocator, DeviceAllocator};
pub use deferred::{DeferredRelease, ReleaseCallback};
pub use helpers::ensure_contiguous;
pub use traits::{Device, Runtime, RuntimeClient};

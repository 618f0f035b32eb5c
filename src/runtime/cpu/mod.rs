//! Host backend
//!
//! The CPU runtime allocates on the heap with 64-byte alignment and runs the
//! split strided copy on a rayon pool (when the `rayon` feature is enabled).
//!
//! # Parallelism
//!
//! By default work runs on rayon's global pool. A client can be given its own
//! pool and task granularity with [`CpuClient::with_parallelism`]:
//!
//! ```
//! use splitr::runtime::cpu::{CpuClient, CpuDevice, ParallelismConfig};
//!
//! let client = CpuClient::new(CpuDevice::new())
//!     .with_parallelism(ParallelismConfig::new(Some(2), Some(64)));
//! assert_eq!(client.parallelism().max_threads, Some(2));
//! ```

mod client;
mod device;
pub(crate) mod helpers;
pub mod kernels;
mod runtime;

pub use client::{CpuAllocator, CpuClient, ParallelismConfig};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;

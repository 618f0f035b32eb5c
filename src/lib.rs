//! # splitr
//!
//! **Equal-part tensor splitting for Rust on CPU and CUDA.**
//!
//! splitr cuts an n-dimensional tensor into `num_split` equally sized parts
//! along one axis. The same API runs on every backend, and outputs alias the
//! input whenever that is possible without breaking the backend's alignment.
//!
//! ## Execution paths
//!
//! - **Identity**: `num_split == 1` returns the input itself
//! - **Dim-0 views**: splitting the outermost axis of a contiguous tensor whose
//!   parts start on aligned addresses returns zero-copy views
//! - **General**: everything else is copied into fresh contiguous outputs,
//!   with a rayon-parallel strided copy on CPU and a single batched kernel
//!   launch on CUDA
//!
//! ## Example
//!
//! ```rust
//! use splitr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], &device);
//! let parts = client.split(&a, 1, 3)?;
//!
//! assert_eq!(parts.len(), 3);
//! assert_eq!(parts[1].shape(), &[2, 1]);
//! assert_eq!(parts[1].to_vec::<f32>(), vec![2.0, 5.0]);
//! # Ok::<(), splitr::error::Error>(())
//! ```
//!
//! ## Cargo features
//!
//! | feature | default | enables |
//! |---------|---------|---------|
//! | `cpu`   | yes     | [`runtime::cpu`] |
//! | `rayon` | yes     | multi-threaded CPU copies |
//! | `cuda`  | no      | [`runtime::cuda`], needs `nvcc` at build time |
//! | `f16`   | no      | `Element` impls for `half::f16` and `half::bf16` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Everything needed to build tensors and split them
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops::SplitOps;
    pub use crate::runtime::{Device, Runtime, RuntimeClient};
    pub use crate::tensor::{Layout, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime, ParallelismConfig};

    #[cfg(feature = "cuda")]
    pub use crate::runtime::cuda::{CudaClient, CudaDevice, CudaRuntime};
}

/// `CudaRuntime` when built with `cuda`
#[cfg(feature = "cuda")]
pub type DefaultRuntime = runtime::cuda::CudaRuntime;

/// `CpuRuntime` when built without `cuda`
#[cfg(all(feature = "cpu", not(feature = "cuda")))]
pub type DefaultRuntime = runtime::cpu::CpuRuntime;

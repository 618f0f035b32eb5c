//! The split operation
//!
//! Clients implement [`SplitOps`], so a split always knows which device,
//! stream or thread pool its outputs belong to.
//!
//! ```text
//! RuntimeClient<R>
//!   └── implements SplitOps<R>
//!         ├── split                  (equal parts along one axis)
//!         └── split_with_dim_tensor  (axis read from a tensor)
//! ```
//!
//! Validation, geometry and the zero-copy fast paths live in
//! [`crate::runtime::split_ops`] and are shared by every backend. Backends
//! only implement the copying half ([`SplitExecutor`]).

mod dispatch;
mod traits;

#[cfg(feature = "cpu")]
mod cpu;

#[cfg(feature = "cuda")]
mod cuda;

pub use crate::runtime::split_ops::{
    FastPath, SplitDims, SplitExecutor, SplitParams, detect_fast_path, split_fast_path,
    validate_split,
};
pub use traits::SplitOps;

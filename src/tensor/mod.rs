//! Tensor types
//!
//! This module provides the `Tensor` type, an n-dimensional array stored on a
//! compute device (CPU or CUDA), together with its storage and layout pieces.

mod core;
mod layout;
mod storage;

pub use core::Tensor;
pub use layout::Layout;
pub use storage::Storage;

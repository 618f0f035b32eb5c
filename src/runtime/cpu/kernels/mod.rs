//! CPU kernel implementations
//!
//! Kernels are generic over `T: Element` and work on raw pointers.

#![allow(unsafe_op_in_unsafe_fn)] // Kernels are already marked unsafe, inner unsafe is redundant

pub mod split;

pub use split::{StridedView3, strided_copy_3d};

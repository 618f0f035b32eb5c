//! Helper functions for CPU tensor operations
//!
//! Operation trait implementations in `ops::cpu` forward to these.

pub mod split;

pub use split::{split_impl, split_with_dim_tensor_impl};

//! CUDA kernels and their launchers
//!
//! | source            | kernels            | launcher              |
//! |-------------------|--------------------|-----------------------|
//! | `split.cu`        | `split_<dtype>`    | [`launch_split`]      |
//! | `strided_copy.cu` | `strided_copy`     | [`launch_strided_copy`] |
//!
//! `loader` caches the PTX modules and computes launch geometry.

mod loader;
mod split;
mod strided_copy;

pub use split::launch_split;
pub use strided_copy::launch_strided_copy;

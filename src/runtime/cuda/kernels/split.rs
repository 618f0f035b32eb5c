//! Batched split launcher
//!
//! One launch writes every output of a split. The kernel walks the input once
//! in a grid-stride loop and scatters each element through a device-resident
//! table of output pointers.

use cudarc::driver::PushKernelArg;
use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

use super::loader::{grid_stride_config, kernel_name, load_kernel};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::split_ops::SplitDims;

const SPLIT_MODULE: &str = "split";

/// Launch `split_<dtype>` over an input collapsed to `dims`.
///
/// # Safety
///
/// - `input_ptr` must be valid device memory holding `dims.numel()` contiguous
///   elements of `dtype`
/// - `out_ptrs` must point to device memory holding `num_split` device
///   pointers, each to room for `dims.numel() / num_split` elements
/// - `dims.split` must be divisible by `num_split`
#[allow(clippy::too_many_arguments)]
pub unsafe fn launch_split(
    context: &Arc<CudaContext>,
    stream: &CudaStream,
    device_index: usize,
    dtype: DType,
    input_ptr: u64,
    num_split: usize,
    dims: SplitDims,
    out_ptrs: u64,
) -> Result<()> {
    let numel = dims.numel();
    if numel == 0 {
        return Ok(());
    }

    let num_split_u32 = u32::try_from(num_split).map_err(|_| {
        Error::Internal(format!("split kernel supports at most u32::MAX outputs, got {}", num_split))
    })?;

    let func = load_kernel(context, device_index, SPLIT_MODULE, &kernel_name("split", dtype))?;

    let prefix = dims.prefix as u64;
    let split = dims.split as u64;
    let suffix = dims.suffix as u64;

    let mut builder = stream.launch_builder(&func);
    builder.arg(&input_ptr);
    builder.arg(&num_split_u32);
    builder.arg(&prefix);
    builder.arg(&split);
    builder.arg(&suffix);
    builder.arg(&out_ptrs);

    unsafe { builder.launch(grid_stride_config(numel)) }.map_err(|e| {
        Error::Internal(format!(
            "CUDA split kernel launch failed for {}: {:?}",
            dtype, e
        ))
    })?;

    Ok(())
}

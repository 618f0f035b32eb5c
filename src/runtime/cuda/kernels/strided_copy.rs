//! Strided gather into a contiguous buffer
//!
//! Backs `copy_strided`, which `ensure_contiguous` uses to materialize
//! transposed or narrowed inputs before a general-path split. Shape and
//! strides travel to the device as two small scratch tables uploaded through
//! [`upload_deferred`], so the launch never blocks the host.

use cudarc::driver::PushKernelArg;
use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

use super::loader::{grid_stride_config, load_kernel};
use crate::error::{Error, Result};
use crate::runtime::DeferredRelease;
use crate::runtime::cuda::stream::{alloc_async, free_async, upload_deferred};

const STRIDED_COPY_MODULE: &str = "strided_copy";

/// Rank limit of the gather kernel (`MAX_DIMS` in `strided_copy.cu`)
const MAX_DIMS: usize = 8;

/// Gather `shape` elements of `elem_size` bytes, laid out with element
/// `strides` starting `src_byte_offset` bytes into `src_ptr`, into `dst_ptr`.
///
/// # Safety
///
/// - every element the view addresses must lie inside the `src_ptr` buffer
/// - `dst_ptr` must have room for `shape.iter().product() * elem_size` bytes
/// - both buffers must belong to `context`
#[allow(clippy::too_many_arguments)]
pub unsafe fn launch_strided_copy(
    context: &Arc<CudaContext>,
    stream: &CudaStream,
    device_index: usize,
    src_ptr: u64,
    src_byte_offset: usize,
    dst_ptr: u64,
    shape: &[usize],
    strides: &[isize],
    elem_size: usize,
) -> Result<()> {
    let numel: usize = shape.iter().product();
    if numel == 0 || shape.is_empty() {
        return Ok(());
    }
    if shape.len() > MAX_DIMS {
        return Err(Error::Internal(format!(
            "strided_copy supports at most {} dimensions, got {}",
            MAX_DIMS,
            shape.len()
        )));
    }

    let func = load_kernel(context, device_index, STRIDED_COPY_MODULE, "strided_copy")?;

    let shape_table: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
    let stride_table: Vec<i64> = strides.iter().map(|&s| s as i64).collect();
    let table_bytes = shape.len() * std::mem::size_of::<u64>();

    let shape_ptr = alloc_async(stream, table_bytes)?;
    let strides_ptr = alloc_async(stream, table_bytes).inspect_err(|_| free_async(stream, shape_ptr))?;

    let numel_arg = numel as u64;
    let ndim_arg = shape.len() as u32;
    let elem_size_arg = elem_size as u32;
    let offset_arg = src_byte_offset as u64;

    let launched = upload_deferred(stream, shape_ptr, DeferredRelease::new(shape_table))
        .and_then(|_| upload_deferred(stream, strides_ptr, DeferredRelease::new(stride_table)))
        .and_then(|_| {
            let mut builder = stream.launch_builder(&func);
            builder.arg(&src_ptr);
            builder.arg(&dst_ptr);
            builder.arg(&shape_ptr);
            builder.arg(&strides_ptr);
            builder.arg(&numel_arg);
            builder.arg(&ndim_arg);
            builder.arg(&elem_size_arg);
            builder.arg(&offset_arg);
            unsafe { builder.launch(grid_stride_config(numel)) }
                .map(|_| ())
                .map_err(|e| Error::Internal(format!("strided_copy launch failed: {:?}", e)))
        });

    // Stream-ordered: released after the gather has read both tables
    free_async(stream, shape_ptr);
    free_async(stream, strides_ptr);
    launched
}

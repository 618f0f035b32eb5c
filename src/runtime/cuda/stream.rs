//! Stream-ordered helpers: scratch buffers, host staging and health checks
//!
//! Small host arrays (output pointer tables, shapes, strides) are uploaded with
//! `cuMemcpyHtoDAsync`, which reads the host buffer after the call returns.
//! [`upload_deferred`] keeps the host buffer alive in a [`DeferredRelease`]
//! whose last reference is dropped by a host function enqueued right behind
//! the copy, so the staging memory is freed only once the copy has run.

use bytemuck::Pod;
use cudarc::driver::safe::CudaStream;
use cudarc::driver::sys::{self, CUresult};
use std::ffi::c_void;

use super::cache::log_cuda_memory_error;
use crate::error::{Error, Result};
use crate::runtime::{DeferredRelease, ReleaseCallback};

/// Allocate `size_bytes` of scratch device memory on `stream`.
pub(crate) fn alloc_async(stream: &CudaStream, size_bytes: usize) -> Result<u64> {
    if size_bytes == 0 {
        return Ok(0);
    }

    let mut ptr: u64 = 0;
    let result = unsafe { sys::cuMemAllocAsync(&mut ptr, size_bytes, stream.cu_stream()) };
    if result != CUresult::CUDA_SUCCESS {
        tracing::warn!(size_bytes, result = ?result, "CUDA scratch allocation failed");
        return Err(Error::OutOfMemory { size: size_bytes });
    }
    Ok(ptr)
}

/// Free scratch memory after all work already enqueued on `stream`.
pub(crate) fn free_async(stream: &CudaStream, ptr: u64) {
    if ptr == 0 {
        return;
    }

    let result = unsafe { sys::cuMemFreeAsync(ptr, stream.cu_stream()) };
    if result != CUresult::CUDA_SUCCESS {
        log_cuda_memory_error("cuMemFreeAsync", ptr, result);
    }
}

/// Copy `staging` to device memory at `dst` without blocking the host.
///
/// The staging buffer is released by a stream callback once the copy has
/// completed. `dst` must have room for `staging.len()` elements.
pub(crate) fn upload_deferred<T>(
    stream: &CudaStream,
    dst: u64,
    staging: DeferredRelease<Vec<T>>,
) -> Result<()>
where
    T: Pod + Send + Sync,
{
    let bytes: &[u8] = bytemuck::cast_slice(staging.as_slice());
    if bytes.is_empty() {
        return Ok(());
    }

    let result = unsafe {
        sys::cuMemcpyHtoDAsync_v2(
            dst,
            bytes.as_ptr() as *const c_void,
            bytes.len(),
            stream.cu_stream(),
        )
    };
    if result != CUresult::CUDA_SUCCESS {
        // Nothing was enqueued, so dropping the staging buffer here is fine.
        return Err(Error::Backend(format!(
            "CUDA host-to-device copy failed: {} bytes ({:?})",
            bytes.len(),
            result
        )));
    }

    staging.release_with(|callback| enqueue_host_callback(stream, callback))
}

unsafe extern "C" fn run_release_callback(user_data: *mut c_void) {
    // SAFETY: user_data came from Box::into_raw in enqueue_host_callback and
    // the driver invokes each host function exactly once.
    let callback = unsafe { Box::from_raw(user_data as *mut ReleaseCallback) };
    callback();
}

/// Run `callback` on a driver thread once all prior work on `stream` is done.
///
/// The callback must not call into the CUDA API. If the driver refuses the
/// host function, the stream is drained before the callback is dropped so the
/// resources it owns outlive any work that still reads them.
pub(crate) fn enqueue_host_callback(stream: &CudaStream, callback: ReleaseCallback) -> Result<()> {
    let user_data = Box::into_raw(Box::new(callback)) as *mut c_void;
    let result = unsafe {
        sys::cuLaunchHostFunc(stream.cu_stream(), Some(run_release_callback), user_data)
    };

    if result != CUresult::CUDA_SUCCESS {
        if let Err(e) = stream.synchronize() {
            tracing::warn!(error = ?e, "CUDA stream synchronization failed");
        }
        // SAFETY: the driver did not take ownership of user_data.
        drop(unsafe { Box::from_raw(user_data as *mut ReleaseCallback) });
        return Err(Error::Internal(format!(
            "Failed to enqueue host callback on CUDA stream ({:?})",
            result
        )));
    }

    Ok(())
}

/// Check that `stream` has not entered an error state.
///
/// Work still running (`CUDA_ERROR_NOT_READY`) counts as healthy.
pub(crate) fn check_stream_health(stream: &CudaStream, op: &str) -> Result<()> {
    let result = unsafe { sys::cuStreamQuery(stream.cu_stream()) };
    match result {
        CUresult::CUDA_SUCCESS | CUresult::CUDA_ERROR_NOT_READY => Ok(()),
        status => Err(Error::Internal(format!(
            "Launch of gpu kernel for {} failed: {:?}",
            op, status
        ))),
    }
}

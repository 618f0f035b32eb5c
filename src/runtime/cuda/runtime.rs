//! CUDA runtime: device buffers on the cached client's stream

use super::cache::{
    is_cuda_context_valid, log_cuda_memory_error, reset_client, try_get_cached_stream,
    try_get_or_create_client,
};
use super::client::{CudaAllocator, CudaClient};
use super::device::CudaDevice;
use super::kernels;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use cudarc::driver::sys::{self, CUresult};
use std::ffi::c_void;

/// Alignment the split fast path requires of CUDA sub-buffers.
///
/// `cuMemAlloc` returns 256-byte aligned pointers; a view starting on such a
/// boundary is indistinguishable from a fresh allocation to a kernel.
const CUDA_ALIGNMENT: usize = 256;

/// NVIDIA GPU backend
///
/// All memory traffic is queued on the device's cached client stream.
#[derive(Clone, Debug, Default)]
pub struct CudaRuntime;

fn alloc_on(client: &CudaClient, size_bytes: usize) -> Option<u64> {
    let mut ptr: u64 = 0;
    let result = unsafe { sys::cuMemAllocAsync(&mut ptr, size_bytes, client.stream.cu_stream()) };
    (result == CUresult::CUDA_SUCCESS).then_some(ptr)
}

impl Runtime for CudaRuntime {
    type Device = CudaDevice;
    type Client = CudaClient;
    type Allocator = CudaAllocator;

    fn name() -> &'static str {
        "cuda"
    }

    fn alignment() -> usize {
        CUDA_ALIGNMENT
    }

    /// Stream-ordered allocation with two retries: after draining the stream
    /// (pending frees), then on a fresh client (sticky stream error).
    fn allocate(size_bytes: usize, device: &CudaDevice) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let client = try_get_or_create_client(device)?;
        if let Some(ptr) = alloc_on(&client, size_bytes) {
            return Ok(ptr);
        }

        if let Err(e) = client.stream.synchronize() {
            tracing::warn!(error = ?e, "CUDA stream synchronization failed");
        }
        if let Some(ptr) = alloc_on(&client, size_bytes) {
            return Ok(ptr);
        }

        drop(client);
        reset_client(device)
            .and_then(|fresh| alloc_on(&fresh, size_bytes))
            .ok_or(Error::OutOfMemory { size: size_bytes })
    }

    fn deallocate(ptr: u64, _size_bytes: usize, device: &CudaDevice) {
        // Without a live context the driver reclaims everything itself.
        if ptr == 0 || !unsafe { is_cuda_context_valid() } {
            return;
        }

        let result = unsafe {
            match try_get_cached_stream(device.index) {
                Some(stream) => sys::cuMemFreeAsync(ptr, stream),
                None => sys::cuMemFree_v2(ptr),
            }
        };
        if result != CUresult::CUDA_SUCCESS && result != CUresult::CUDA_ERROR_ILLEGAL_ADDRESS {
            log_cuda_memory_error("cuMemFree", ptr, result);
        }
    }

    /// Blocks until the copy has run, since `src` is only borrowed.
    fn copy_to_device(src: &[u8], dst: u64, device: &CudaDevice) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        let client = try_get_or_create_client(device)?;
        let result = unsafe {
            sys::cuMemcpyHtoDAsync_v2(
                dst,
                src.as_ptr() as *const c_void,
                src.len(),
                client.stream.cu_stream(),
            )
        };
        if result != CUresult::CUDA_SUCCESS {
            return Err(Error::Backend(format!(
                "CUDA host-to-device copy of {} bytes failed ({:?})",
                src.len(),
                result
            )));
        }

        client.stream.synchronize()?;
        Ok(())
    }

    /// Blocks until the copy, and every split queued before it, has run.
    fn copy_from_device(src: u64, dst: &mut [u8], device: &CudaDevice) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        let client = try_get_or_create_client(device)?;
        let result = unsafe {
            sys::cuMemcpyDtoHAsync_v2(
                dst.as_mut_ptr() as *mut c_void,
                src,
                dst.len(),
                client.stream.cu_stream(),
            )
        };
        if result != CUresult::CUDA_SUCCESS {
            return Err(Error::Backend(format!(
                "CUDA device-to-host copy of {} bytes failed ({:?})",
                dst.len(),
                result
            )));
        }

        client.stream.synchronize()?;
        Ok(())
    }

    /// One `strided_copy` launch; does not block the host.
    fn copy_strided(
        src_handle: u64,
        src_byte_offset: usize,
        dst_handle: u64,
        shape: &[usize],
        strides: &[isize],
        elem_size: usize,
        device: &CudaDevice,
    ) -> Result<()> {
        if src_handle == 0 || dst_handle == 0 {
            return Ok(());
        }

        let client = try_get_or_create_client(device)?;
        unsafe {
            kernels::launch_strided_copy(
                &client.context,
                &client.stream,
                device.index,
                src_handle,
                src_byte_offset,
                dst_handle,
                shape,
                strides,
                elem_size,
            )
        }
        .map_err(|e| {
            Error::Backend(format!(
                "strided copy of {:?} x {} bytes on cuda:{} failed: {}",
                shape, elem_size, device.index, e
            ))
        })
    }

    fn default_device() -> CudaDevice {
        CudaDevice::new(0)
    }

    /// The cached client for `device`.
    ///
    /// # Panics
    ///
    /// Panics if no CUDA context can be created for the device. Check
    /// [`is_cuda_available`] first when CUDA may be absent.
    fn default_client(device: &CudaDevice) -> CudaClient {
        match try_get_or_create_client(device) {
            Ok(client) => client,
            Err(e) => panic!("Failed to create CUDA client for {:?}: {}", device, e),
        }
    }
}

/// GPU 0
pub fn cuda_device() -> CudaDevice {
    CudaDevice::new(0)
}

/// GPU `device_id`
pub fn cuda_device_id(device_id: usize) -> CudaDevice {
    CudaDevice::new(device_id)
}

/// True when a client for GPU 0 can be created
pub fn is_cuda_available() -> bool {
    std::panic::catch_unwind(|| try_get_or_create_client(&CudaDevice::new(0)).is_ok())
        .unwrap_or(false)
}

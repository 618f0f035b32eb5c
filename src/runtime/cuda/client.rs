//! CUDA client: one context and one stream per device
//!
//! `CudaClient` is cheap to clone; clones share the context and stream.
//! A split launches its kernel and allocates its outputs on the client it
//! runs on. Uploads, downloads and packing copies go through the cached
//! client's stream, which is what orders a split after the writes that
//! produced its input and before the reads of its outputs.

use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

use super::CudaRuntime;
use super::cache::is_cuda_context_valid;
use super::device::{CudaDevice, CudaError};
use super::stream::{alloc_async, free_async};
use crate::error::Result;
use crate::runtime::{Allocator, RuntimeClient};

/// Stream-ordered allocator (`cuMemAllocAsync` / `cuMemFreeAsync`)
///
/// Memory is allocated and freed on the owning client's stream, so kernels
/// that client launches see it without extra synchronization.
#[derive(Clone)]
pub struct CudaAllocator {
    stream: Arc<CudaStream>,
}

impl Allocator for CudaAllocator {
    /// Retries once after draining the stream, which lets pending frees land.
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        match alloc_async(&self.stream, size_bytes) {
            Ok(ptr) => Ok(ptr),
            Err(_) => {
                self.stream.synchronize()?;
                alloc_async(&self.stream, size_bytes)
            }
        }
    }

    fn deallocate(&self, ptr: u64, _size_bytes: usize) {
        // Without a live context the driver reclaims everything itself.
        if ptr != 0 && unsafe { is_cuda_context_valid() } {
            free_async(&self.stream, ptr);
        }
    }
}

/// Runs operations on one GPU
///
/// Outputs of a split are complete only once the work queued on
/// [`stream`](Self::stream) has run. Consumers must be ordered on the same
/// stream or call [`synchronize`](RuntimeClient::synchronize) first.
#[derive(Clone)]
pub struct CudaClient {
    pub(crate) device: CudaDevice,
    pub(crate) context: Arc<CudaContext>,
    pub(crate) stream: Arc<CudaStream>,
    allocator: CudaAllocator,
}

impl CudaClient {
    /// Create a context and a fresh stream for `device`
    ///
    /// Prefer [`Runtime::default_client`](crate::runtime::Runtime::default_client),
    /// which reuses one client per device.
    pub fn new(device: CudaDevice) -> std::result::Result<Self, CudaError> {
        let context = CudaContext::new(device.index).map_err(|e| {
            CudaError::Context(format!("cannot create context on device {}: {:?}", device.index, e))
        })?;
        context
            .bind_to_thread()
            .map_err(|e| CudaError::Context(format!("cannot bind context: {:?}", e)))?;
        let stream = context
            .new_stream()
            .map_err(|e| CudaError::Context(format!("cannot create stream: {:?}", e)))?;

        Ok(Self {
            device,
            allocator: CudaAllocator {
                stream: stream.clone(),
            },
            context,
            stream,
        })
    }

    /// The stream all work for this device is queued on
    #[inline]
    pub fn stream(&self) -> &CudaStream {
        &self.stream
    }

    /// The device's context
    #[inline]
    pub fn context(&self) -> &Arc<CudaContext> {
        &self.context
    }
}

impl std::fmt::Debug for CudaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaClient")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl RuntimeClient<CudaRuntime> for CudaClient {
    fn device(&self) -> &CudaDevice {
        &self.device
    }

    fn synchronize(&self) {
        if let Err(e) = self.stream.synchronize() {
            tracing::warn!(device = self.device.index, error = ?e, "CUDA stream synchronization failed");
        }
    }

    fn allocator(&self) -> &CudaAllocator {
        &self.allocator
    }
}

//! Process-wide client per device

use super::client::CudaClient;
use super::device::CudaDevice;
use crate::error::Result;
use cudarc::driver::sys::{self, CUresult};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

type ClientMap = HashMap<usize, CudaClient>;

static CLIENTS: OnceLock<Mutex<ClientMap>> = OnceLock::new();

/// Run `f` with the client map locked.
///
/// A poisoned lock is recovered: every update below leaves the map valid.
fn with_clients<T>(f: impl FnOnce(&mut ClientMap) -> T) -> T {
    let clients = CLIENTS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = clients.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// The cached client for `device`, creating it on first use.
pub(super) fn try_get_or_create_client(device: &CudaDevice) -> Result<CudaClient> {
    with_clients(|clients| -> Result<CudaClient> {
        if let Some(client) = clients.get(&device.index) {
            return Ok(client.clone());
        }

        let client = CudaClient::new(device.clone())?;
        clients.insert(device.index, client.clone());
        tracing::debug!(device = device.index, "created CUDA client");
        Ok(client)
    })
}

/// Replace the cached client for `device` with a fresh context and stream.
///
/// Used after the old stream hit a sticky error. Returns `None` if the new
/// client cannot be built; the device then has no cached client.
pub(super) fn reset_client(device: &CudaDevice) -> Option<CudaClient> {
    with_clients(|clients| {
        clients.remove(&device.index);
        match CudaClient::new(device.clone()) {
            Ok(client) => {
                tracing::warn!(device = device.index, "reset CUDA client");
                clients.insert(device.index, client.clone());
                Some(client)
            }
            Err(e) => {
                tracing::warn!(device = device.index, error = %e, "failed to reset CUDA client");
                None
            }
        }
    })
}

/// Raw stream of the cached client, if one exists. Never creates a client.
pub(super) fn try_get_cached_stream(device_index: usize) -> Option<sys::CUstream> {
    CLIENTS.get()?;
    with_clients(|clients| clients.get(&device_index).map(|c| c.stream.cu_stream()))
}

/// True when the calling thread has a current CUDA context.
///
/// # Safety
///
/// Calls the driver directly. The answer only describes this thread.
#[inline]
pub(super) unsafe fn is_cuda_context_valid() -> bool {
    let mut ctx: sys::CUcontext = std::ptr::null_mut();
    let result = unsafe { sys::cuCtxGetCurrent(&mut ctx) };
    result == CUresult::CUDA_SUCCESS && !ctx.is_null()
}

/// Log a failed driver memory call without failing the caller.
#[cold]
#[inline(never)]
pub(crate) fn log_cuda_memory_error(operation: &str, ptr: u64, result: CUresult) {
    tracing::warn!(
        operation,
        ptr = %format!("0x{:x}", ptr),
        result = ?result,
        "CUDA memory operation failed"
    );
}

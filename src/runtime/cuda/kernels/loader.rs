//! PTX module cache and launch geometry
//!
//! `build.rs` compiles every `.cu` file in this directory to PTX under
//! `CUDA_KERNEL_DIR`. A module is loaded into a device's context the first
//! time one of its kernels is needed and kept for the life of the process.

use cudarc::driver::safe::{CudaContext, CudaFunction, CudaModule, LaunchConfig};
use cudarc::nvrtc::Ptx;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::dtype::DType;
use crate::error::{Error, Result};

const KERNEL_DIR: &str = env!("CUDA_KERNEL_DIR");

/// Threads per block for grid-stride kernels
pub const BLOCK_SIZE: u32 = 256;

/// Upper bound on blocks for grid-stride kernels
pub const MAX_GRID_BLOCKS: u32 = 65_535;

type ModuleKey = (usize, &'static str);

static MODULES: OnceLock<Mutex<HashMap<ModuleKey, Arc<CudaModule>>>> = OnceLock::new();

fn module(context: &Arc<CudaContext>, device_index: usize, name: &'static str) -> Result<Arc<CudaModule>> {
    let modules = MODULES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut modules = modules.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(module) = modules.get(&(device_index, name)) {
        return Ok(module.clone());
    }

    let ptx = Ptx::from_file(format!("{}/{}.ptx", KERNEL_DIR, name));
    let module = context.load_module(ptx).map_err(|e| {
        Error::Internal(format!("cannot load CUDA module '{}': {:?}", name, e))
    })?;
    tracing::debug!(device = device_index, module = name, "loaded CUDA module");

    modules.insert((device_index, name), module.clone());
    Ok(module)
}

/// Look up `kernel` in PTX module `module_name`, loading the module if needed.
pub fn load_kernel(
    context: &Arc<CudaContext>,
    device_index: usize,
    module_name: &'static str,
    kernel: &str,
) -> Result<CudaFunction> {
    module(context, device_index, module_name)?
        .load_function(kernel)
        .map_err(|e| {
            Error::Internal(format!(
                "kernel '{}' missing from module '{}': {:?}",
                kernel, module_name, e
            ))
        })
}

/// Launch geometry for a grid-stride loop over `numel` elements.
///
/// One thread per element up to [`MAX_GRID_BLOCKS`] blocks; past that each
/// thread strides over several elements.
pub fn grid_stride_config(numel: usize) -> LaunchConfig {
    let blocks = numel
        .div_ceil(BLOCK_SIZE as usize)
        .clamp(1, MAX_GRID_BLOCKS as usize);
    LaunchConfig {
        grid_dim: (blocks as u32, 1, 1),
        block_dim: (BLOCK_SIZE, 1, 1),
        shared_mem_bytes: 0,
    }
}

/// Per-dtype kernel symbol, e.g. `split_f32`
pub fn kernel_name(base: &str, dtype: DType) -> String {
    format!("{}_{}", base, dtype.short_name())
}

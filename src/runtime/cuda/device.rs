//! CUDA device handle and setup errors

use crate::error::Error;
use crate::runtime::Device;
use cudarc::driver::result::device;
use cudarc::driver::sys::CUdevice_attribute;

/// One GPU, by ordinal
///
/// The handle is just an index; the context and stream for it live in the
/// cached [`CudaClient`](super::CudaClient).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CudaDevice {
    pub(crate) index: usize,
}

impl CudaDevice {
    /// Handle for GPU `index`
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// `(major, minor)` compute capability, e.g. `(8, 6)` for sm_86
    pub fn compute_capability(&self) -> Result<(u32, u32), CudaError> {
        let dev = device::get(self.index as i32)
            .map_err(|e| CudaError::Device(format!("cannot open device {}: {:?}", self.index, e)))?;

        let read = |attr: CUdevice_attribute| {
            unsafe { device::get_attribute(dev, attr) }
                .map(|v| v as u32)
                .map_err(|e| CudaError::Device(format!("cannot read {:?}: {:?}", attr, e)))
        };

        Ok((
            read(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)?,
            read(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)?,
        ))
    }
}

impl Device for CudaDevice {
    fn id(&self) -> usize {
        self.index
    }

    fn name(&self) -> String {
        format!("cuda:{}", self.index)
    }
}

/// Failure while opening a device or building its client
#[derive(Debug, Clone, thiserror::Error)]
pub enum CudaError {
    /// Device query failed
    #[error("CUDA device error: {0}")]
    Device(String),
    /// Context or stream creation failed
    #[error("CUDA context error: {0}")]
    Context(String),
}

impl From<CudaError> for Error {
    fn from(err: CudaError) -> Self {
        Error::Backend(err.to_string())
    }
}

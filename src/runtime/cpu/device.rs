//! The host CPU as a device

use crate::runtime::Device;

/// The host CPU; every instance names the same device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CpuDevice;

impl CpuDevice {
    /// Handle to the host CPU
    pub fn new() -> Self {
        Self
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        0
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}

//! Client-bound allocation

use crate::error::Result;
use crate::runtime::Runtime;

/// Allocation on the device a client is bound to
///
/// Pointers are plain `u64` addresses (host pointers on the CPU). A zero
/// `size_bytes` yields the null address 0, which `deallocate` ignores.
pub trait Allocator: Clone + Send + Sync {
    /// `size_bytes` of uninitialized memory, or `Err(OutOfMemory)`
    fn allocate(&self, size_bytes: usize) -> Result<u64>;

    /// Return memory obtained from [`allocate`](Self::allocate) with the same size
    fn deallocate(&self, ptr: u64, size_bytes: usize);
}

/// Forwards to [`Runtime::allocate`] and [`Runtime::deallocate`] for one device
pub struct DeviceAllocator<R: Runtime> {
    device: R::Device,
}

impl<R: Runtime> DeviceAllocator<R> {
    /// Allocator for `device`
    pub fn new(device: R::Device) -> Self {
        Self { device }
    }

    /// Device every allocation lands on
    pub fn device(&self) -> &R::Device {
        &self.device
    }
}

impl<R: Runtime> Clone for DeviceAllocator<R> {
    fn clone(&self) -> Self {
        Self::new(self.device.clone())
    }
}

impl<R: Runtime> std::fmt::Debug for DeviceAllocator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceAllocator({})", R::name())
    }
}

impl<R: Runtime> Allocator for DeviceAllocator<R> {
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        R::allocate(size_bytes, &self.device)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        R::deallocate(ptr, size_bytes, &self.device)
    }
}

#[cfg(all(test, feature = "cpu"))]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_zero_bytes_is_null() {
        let allocator = DeviceAllocator::<CpuRuntime>::new(CpuDevice::new());
        assert_eq!(allocator.allocate(0).unwrap(), 0);
        allocator.deallocate(0, 0);
    }

    #[test]
    fn test_cpu_allocation_is_aligned() {
        let allocator = DeviceAllocator::<CpuRuntime>::new(CpuDevice::new());
        let ptr = allocator.allocate(100).unwrap();
        assert_eq!(ptr % CpuRuntime::alignment() as u64, 0);
        allocator.deallocate(ptr, 100);
    }
}

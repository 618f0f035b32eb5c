//! Reference-counted device buffers

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{Allocator, Runtime, RuntimeClient};
use std::sync::Arc;

/// One device allocation, shared by every tensor viewing it
///
/// Cloning bumps a reference count. The buffer goes back to whoever handed it
/// out when the last handle is dropped: the client allocator for
/// [`new_in`](Self::new_in), [`Runtime::deallocate`] otherwise. A split part
/// that aliases its input keeps the whole input buffer alive.
pub struct Storage<R: Runtime> {
    buffer: Arc<Buffer<R>>,
}

struct Buffer<R: Runtime> {
    ptr: u64,
    /// Element count, not bytes
    len: usize,
    dtype: DType,
    device: R::Device,
    /// Set when the memory came from a client allocator
    allocator: Option<R::Allocator>,
}

impl<R: Runtime> Buffer<R> {
    fn byte_len(&self) -> usize {
        self.len * self.dtype.size_in_bytes()
    }
}

impl<R: Runtime> Drop for Buffer<R> {
    fn drop(&mut self) {
        if self.ptr == 0 {
            return;
        }
        match &self.allocator {
            Some(allocator) => allocator.deallocate(self.ptr, self.byte_len()),
            None => R::deallocate(self.ptr, self.byte_len(), &self.device),
        }
    }
}

fn byte_size(len: usize, dtype: DType) -> Result<usize> {
    len.checked_mul(dtype.size_in_bytes())
        .ok_or(Error::OutOfMemory { size: usize::MAX })
}

impl<R: Runtime> Storage<R> {
    /// Uninitialized room for `len` elements of `dtype` on `device`.
    ///
    /// Fails with `OutOfMemory` if the byte count overflows or the device
    /// refuses the allocation.
    pub fn new(len: usize, dtype: DType, device: &R::Device) -> Result<Self> {
        let ptr = R::allocate(byte_size(len, dtype)?, device)?;
        Ok(Self::adopt(ptr, len, dtype, device, None))
    }

    /// Like [`new`](Self::new), but allocated and later released through
    /// `client`'s allocator, so the memory is ordered with the client's work.
    pub fn new_in(len: usize, dtype: DType, client: &R::Client) -> Result<Self> {
        let allocator = client.allocator();
        let ptr = allocator.allocate(byte_size(len, dtype)?)?;
        Ok(Self::adopt(ptr, len, dtype, client.device(), Some(allocator.clone())))
    }

    /// Upload a typed host slice
    pub fn from_slice<T: Element>(data: &[T], device: &R::Device) -> Result<Self> {
        Self::from_bytes(bytemuck::cast_slice(data), T::DTYPE, device)
    }

    /// Upload raw bytes, interpreting them as elements of `dtype`
    pub fn from_bytes(data: &[u8], dtype: DType, device: &R::Device) -> Result<Self> {
        let width = dtype.size_in_bytes();
        if data.len() % width != 0 {
            return Err(Error::invalid_argument(
                "data",
                format!("{} bytes do not divide into {} elements", data.len(), dtype),
            ));
        }

        let ptr = R::allocate(data.len(), device)?;
        let storage = Self::adopt(ptr, data.len() / width, dtype, device, None);
        R::copy_to_device(data, storage.ptr(), device)?;
        Ok(storage)
    }

    fn adopt(
        ptr: u64,
        len: usize,
        dtype: DType,
        device: &R::Device,
        allocator: Option<R::Allocator>,
    ) -> Self {
        Self {
            buffer: Arc::new(Buffer {
                ptr,
                len,
                dtype,
                device: device.clone(),
                allocator,
            }),
        }
    }

    /// Base address of the allocation (0 for an empty buffer)
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.buffer.ptr
    }

    /// Capacity in elements
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len
    }

    /// True for a zero-element buffer
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.len == 0
    }

    /// Element type the buffer was created with
    #[inline]
    pub fn dtype(&self) -> DType {
        self.buffer.dtype
    }

    /// Device owning the allocation
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.buffer.device
    }

    /// Capacity in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.buffer.byte_len()
    }

    /// Client allocator the buffer will be returned to, if it came from one
    #[inline]
    pub fn allocator(&self) -> Option<&R::Allocator> {
        self.buffer.allocator.as_ref()
    }

    /// Number of live handles on this allocation
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.buffer)
    }

    /// True when both handles name the same allocation
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl<R: Runtime> Clone for Storage<R> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Storage(0x{:x}, {} x {}, refs={})",
            self.buffer.ptr,
            self.buffer.len,
            self.buffer.dtype,
            self.ref_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    #[test]
    fn test_clone_shares_allocation() {
        let device = CpuDevice::new();
        let a = Storage::<CpuRuntime>::from_slice(&[1.0f32, 2.0], &device).unwrap();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);
        assert_eq!(b.size_in_bytes(), 8);

        drop(a);
        assert_eq!(b.ref_count(), 1);
    }

    #[test]
    fn test_size_overflow_is_out_of_memory() {
        let device = CpuDevice::new();
        let err = Storage::<CpuRuntime>::new(usize::MAX, DType::F32, &device).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
    }

    #[test]
    fn test_from_bytes_rejects_partial_elements() {
        let device = CpuDevice::new();
        let err = Storage::<CpuRuntime>::from_bytes(&[0u8; 3], DType::I16, &device).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_empty_storage_has_null_ptr() {
        let device = CpuDevice::new();
        let storage = Storage::<CpuRuntime>::new(0, DType::F64, &device).unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.ptr(), 0);
    }

    #[test]
    fn test_new_in_records_client_allocator() {
        let client = CpuClient::new(CpuDevice::new());
        let storage = Storage::<CpuRuntime>::new_in(16, DType::F32, &client).unwrap();
        assert_ne!(storage.ptr(), 0);
        assert_eq!(storage.size_in_bytes(), 64);
        assert!(storage.allocator().is_some());

        let plain = Storage::<CpuRuntime>::new(16, DType::F32, client.device()).unwrap();
        assert!(plain.allocator().is_none());
    }
}

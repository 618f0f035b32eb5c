//! Backend memory model

use crate::error::Result;

/// A compute backend, used through static dispatch
///
/// Buffers are opaque `u64` handles: a host address on the CPU, a device
/// pointer on CUDA. Everything above this trait (storage, tensors, split)
/// is written once against it.
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier
    type Device: super::Device;

    /// Operation dispatcher for one device
    type Client: super::RuntimeClient<Self>;

    /// Client-bound allocator
    type Allocator: crate::runtime::Allocator;

    /// Short backend name (`cpu`, `cuda`)
    fn name() -> &'static str;

    /// Byte alignment every allocation of this runtime satisfies.
    ///
    /// A sub-view that starts on a multiple of this value is as good as a
    /// fresh allocation to any kernel, which is what lets the dim-0 split hand
    /// out views instead of copies.
    fn alignment() -> usize;

    /// Allocate `size_bytes`; zero bytes yields the null handle `0`
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when the device cannot satisfy the request.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Release a buffer returned by [`allocate`](Self::allocate)
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Host to device copy; `src` may be reused as soon as this returns
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Device to host copy, ordered after all queued work on the device
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Gather a strided view into the contiguous buffer `dst_handle`
    ///
    /// `strides` are in elements; `src_byte_offset` is where element
    /// `[0, 0, ...]` lives relative to `src_handle`.
    fn copy_strided(
        src_handle: u64,
        src_byte_offset: usize,
        dst_handle: u64,
        shape: &[usize],
        strides: &[isize],
        elem_size: usize,
        device: &Self::Device,
    ) -> Result<()>;

    /// Device used when none is specified
    fn default_device() -> Self::Device;

    /// Shared client for `device`
    fn default_client(device: &Self::Device) -> Self::Client;
}

//! CPU runtime: host heap buffers

use super::client::{CpuAllocator, CpuClient};
use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// Heap alignment for every CPU buffer (one AVX-512 register / cache line)
const CPU_ALIGNMENT: usize = 64;

/// Host CPU backend
///
/// Handles are heap addresses. Copies are plain `memcpy`s and complete
/// before they return.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

fn heap_layout(size_bytes: usize) -> Result<AllocLayout> {
    AllocLayout::from_size_align(size_bytes, CPU_ALIGNMENT)
        .map_err(|_| Error::OutOfMemory { size: size_bytes })
}

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;
    type Allocator = CpuAllocator;

    fn name() -> &'static str {
        "cpu"
    }

    fn alignment() -> usize {
        CPU_ALIGNMENT
    }

    fn allocate(size_bytes: usize, _device: &CpuDevice) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = heap_layout(size_bytes)?;
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }
        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &CpuDevice) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }
        // allocate() already accepted this layout
        if let Ok(layout) = heap_layout(size_bytes) {
            unsafe { dealloc(ptr as *mut u8, layout) };
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &CpuDevice) -> Result<()> {
        if !src.is_empty() && dst != 0 {
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) };
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &CpuDevice) -> Result<()> {
        if !dst.is_empty() && src != 0 {
            unsafe { std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) };
        }
        Ok(())
    }

    fn copy_strided(
        src_handle: u64,
        src_byte_offset: usize,
        dst_handle: u64,
        shape: &[usize],
        strides: &[isize],
        elem_size: usize,
        _device: &CpuDevice,
    ) -> Result<()> {
        let numel: usize = shape.iter().product();
        if src_handle == 0 || dst_handle == 0 || numel == 0 {
            return Ok(());
        }

        let src_base = (src_handle as usize + src_byte_offset) as *const u8;
        let dst_base = dst_handle as *mut u8;

        // Odometer over the destination; `src_elem` tracks the matching source element.
        let mut index = vec![0usize; shape.len()];
        let mut src_elem: isize = 0;
        for dst_elem in 0..numel {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    src_base.offset(src_elem * elem_size as isize),
                    dst_base.add(dst_elem * elem_size),
                    elem_size,
                );
            }

            for d in (0..shape.len()).rev() {
                index[d] += 1;
                src_elem += strides[d];
                if index[d] < shape[d] {
                    break;
                }
                src_elem -= strides[d] * shape[d] as isize;
                index[d] = 0;
            }
        }
        Ok(())
    }

    fn default_device() -> CpuDevice {
        CpuDevice::new()
    }

    fn default_client(device: &CpuDevice) -> CpuClient {
        CpuClient::new(device.clone())
    }
}

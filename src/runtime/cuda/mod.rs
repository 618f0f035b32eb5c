//! NVIDIA GPU backend on top of cudarc
//!
//! One [`CudaClient`] per device, cached for the life of the process, owns a
//! context and a single stream. Buffers come from the stream-ordered pool
//! (`cuMemAllocAsync`), and the split and strided-copy kernels ship as PTX
//! compiled by `build.rs`.
//!
//! # Asynchrony
//!
//! Allocation, copies and kernel launches are enqueued on the client's stream
//! and return before the device has run them. Host reads (`to_vec`) go
//! through `copy_from_device`, which synchronizes the stream first.
//! `Runtime::default_client` panics if no CUDA context can be created; every
//! other entry point reports failures as errors.

mod cache;
mod client;
mod device;
pub(crate) mod kernels;
mod runtime;
pub(crate) mod stream;

pub use client::{CudaAllocator, CudaClient};
pub use device::{CudaDevice, CudaError};
pub use runtime::{CudaRuntime, cuda_device, cuda_device_id, is_cuda_available};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Allocator, DeferredRelease, Device, Runtime, RuntimeClient};

    #[test]
    fn test_device_identity() {
        let device = CudaDevice::new(0);
        assert_eq!(device.id(), 0);
        assert_eq!(device.name(), "cuda:0");
        assert_eq!(CudaRuntime::alignment(), 256);
    }

    #[test]
    fn test_host_device_copies() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let data: Vec<u8> = (1..=8).collect();

        let ptr = CudaRuntime::allocate(data.len(), &device).unwrap();
        CudaRuntime::copy_to_device(&data, ptr, &device).unwrap();

        let mut back = [0u8; 8];
        CudaRuntime::copy_from_device(ptr, &mut back, &device).unwrap();
        assert_eq!(back[..], data[..]);

        CudaRuntime::deallocate(ptr, data.len(), &device);
    }

    #[test]
    fn test_client_allocator_is_stream_ordered() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);
        assert_eq!(client.device().id(), 0);

        let ptr = client.allocator().allocate(256).unwrap();
        assert_ne!(ptr, 0);
        client.allocator().deallocate(ptr, 256);
    }

    #[test]
    fn test_upload_deferred_releases_staging() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);

        let values: Vec<u64> = vec![11, 22, 33, 44];
        let staging = DeferredRelease::new(values.clone());
        let observer = staging.clone();

        let dst = stream::alloc_async(client.stream(), 4 * 8).unwrap();
        stream::upload_deferred(client.stream(), dst, staging).unwrap();
        client.synchronize();

        let mut read = vec![0u64; 4];
        CudaRuntime::copy_from_device(dst, bytemuck::cast_slice_mut(&mut read), &device).unwrap();
        assert_eq!(read, values);

        // The host callback runs on a driver thread shortly after the copy.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while observer.ref_count() > 1 && std::time::Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert_eq!(observer.ref_count(), 1);

        stream::free_async(client.stream(), dst);
        stream::check_stream_health(client.stream(), "upload").unwrap();
    }

    #[test]
    fn test_compute_capability_meets_ptx_target() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let (major, _) = device.compute_capability().unwrap();
        // build.rs targets sm_75
        assert!(major >= 7);
    }
}

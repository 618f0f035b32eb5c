//! Common test utilities
#![allow(dead_code)]

use splitr::dtype::DType;
use splitr::runtime::Runtime;
use splitr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
#[cfg(feature = "cuda")]
use splitr::runtime::cuda::{CudaClient, CudaDevice, CudaRuntime};
use splitr::tensor::Tensor;

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Create a CUDA client and device, returning None if CUDA is unavailable
#[cfg(feature = "cuda")]
pub fn create_cuda_client() -> Option<(CudaClient, CudaDevice)> {
    if !splitr::runtime::cuda::is_cuda_available() {
        return None;
    }
    let init = std::panic::catch_unwind(|| {
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);
        (client, device)
    });
    init.ok()
}

/// `0, 1, 2, ...` as f32, laid out in `shape`
pub fn arange_f32<R: Runtime>(shape: &[usize], device: &R::Device) -> Tensor<R> {
    let n: usize = shape.iter().product();
    let data: Vec<f32> = (0..n).map(|i| i as f32).collect();
    Tensor::<R>::from_slice(&data, shape, device)
}

/// Reference split computed directly from a row-major host buffer
///
/// Part `i` holds the elements whose index along `dim` lies in
/// `[i * delta, (i + 1) * delta)`.
pub fn reference_split<T: Copy>(data: &[T], shape: &[usize], dim: usize, parts: usize) -> Vec<Vec<T>> {
    let prefix: usize = shape[..dim].iter().product();
    let split = shape[dim];
    let suffix: usize = shape[dim + 1..].iter().product();
    let delta = split / parts;

    (0..parts)
        .map(|i| {
            let mut out = Vec::with_capacity(prefix * delta * suffix);
            for p in 0..prefix {
                let start = (p * split + i * delta) * suffix;
                out.extend_from_slice(&data[start..start + delta * suffix]);
            }
            out
        })
        .collect()
}

/// Dtypes whose split is exercised on every backend
pub fn split_test_dtypes() -> Vec<DType> {
    vec![
        DType::F64,
        DType::F32,
        DType::F16,
        DType::BF16,
        DType::I64,
        DType::I32,
        DType::I16,
        DType::I8,
        DType::U64,
        DType::U32,
        DType::U16,
        DType::U8,
        DType::Bool,
    ]
}

/// Deterministic byte pattern for a tensor of `numel` elements of `dtype`
///
/// Bool tensors get 0/1 bytes; every other dtype gets arbitrary bit patterns,
/// since splitting never interprets element values.
pub fn pattern_bytes(numel: usize, dtype: DType) -> Vec<u8> {
    let len = numel * dtype.size_in_bytes();
    if dtype == DType::Bool {
        return (0..len).map(|i| (i % 3 == 0) as u8).collect();
    }
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 3)) as u8).collect()
}

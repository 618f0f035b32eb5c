// Backend parity tests for SplitOps
//
// Every backend must produce the same shapes and bit-identical bytes as the
// CPU backend, on both the view paths and the copying path.

use splitr::dtype::DType;
use splitr::ops::SplitOps;
use splitr::runtime::cpu::CpuRuntime;
#[cfg(feature = "cuda")]
use splitr::runtime::cuda::CudaRuntime;
use splitr::tensor::Tensor;

use crate::backend_parity::helpers::tensor_bytes;
#[cfg(feature = "cuda")]
use crate::backend_parity::helpers::{assert_parity_bytes, with_cuda_backend};
use crate::common::{create_cpu_client, pattern_bytes, split_test_dtypes};

// ============================================================================
// Test Utilities
// ============================================================================

fn test_split_on_backends(shape: &[usize], dtype: DType, split_dim: i64, num_split: i64) {
    let numel: usize = shape.iter().product();
    let bytes = pattern_bytes(numel, dtype);

    let (cpu_client, cpu_device) = create_cpu_client();
    let cpu_tensor = Tensor::<CpuRuntime>::try_from_bytes(&bytes, shape, dtype, &cpu_device).unwrap();
    let cpu_parts = cpu_client.split(&cpu_tensor, split_dim, num_split).unwrap();
    let cpu_data: Vec<Vec<u8>> = cpu_parts.iter().map(tensor_bytes).collect();
    assert_eq!(cpu_parts.len(), num_split as usize);

    #[cfg(feature = "cuda")]
    with_cuda_backend(|cuda_client, cuda_device| {
        let cuda_tensor = Tensor::<CudaRuntime>::try_from_bytes(&bytes, shape, dtype, &cuda_device).unwrap();
        let cuda_parts = cuda_client
            .split(&cuda_tensor, split_dim, num_split)
            .unwrap();
        assert_eq!(cuda_parts.len(), cpu_parts.len());
        for (i, (cpu, cuda)) in cpu_parts.iter().zip(&cuda_parts).enumerate() {
            assert_eq!(cpu.shape(), cuda.shape());
            assert_eq!(cpu.dtype(), cuda.dtype());
            assert_parity_bytes(
                &cpu_data[i],
                &tensor_bytes(cuda),
                &format!("split_{:?}_dim{}_part{}_cuda", dtype, split_dim, i),
            );
        }
    });

    #[cfg(not(feature = "cuda"))]
    let _ = cpu_data;
}

// ============================================================================
// Parity Tests
// ============================================================================

#[test]
fn test_split_parity_every_axis() {
    for (dim, parts) in [(0, 2), (1, 3), (2, 4)] {
        test_split_on_backends(&[4, 6, 8], DType::F32, dim, parts);
    }
}

#[test]
fn test_split_parity_all_dtypes() {
    for dtype in split_test_dtypes() {
        test_split_on_backends(&[6, 10], dtype, 1, 5);
        test_split_on_backends(&[6, 10], dtype, 0, 3);
    }
}

#[test]
fn test_split_parity_dim0_views() {
    // 64 f32 = 256 bytes per row: aligned for both backends
    test_split_on_backends(&[8, 64], DType::F32, 0, 4);
}

#[test]
fn test_split_parity_identity() {
    test_split_on_backends(&[3, 7], DType::I32, 1, 1);
}

#[test]
fn test_split_parity_empty() {
    test_split_on_backends(&[0, 4], DType::F32, 0, 2);
    test_split_on_backends(&[4, 0], DType::F32, 0, 2);
}

#[test]
fn test_split_parity_large() {
    // Exceeds one grid of blocks worth of threads per launch row
    test_split_on_backends(&[64, 300, 17], DType::F32, 1, 3);
}

#[test]
fn test_split_parity_transposed_input() {
    let data: Vec<f32> = (0..48).map(|i| i as f32).collect();

    let (cpu_client, cpu_device) = create_cpu_client();
    let cpu_tensor = Tensor::<CpuRuntime>::from_slice(&data, &[6, 8], &cpu_device)
        .transpose(0, 1)
        .unwrap();
    let cpu_parts = cpu_client.split(&cpu_tensor, 1, 2).unwrap();

    #[cfg(feature = "cuda")]
    with_cuda_backend(|cuda_client, cuda_device| {
        let cuda_tensor = Tensor::<CudaRuntime>::from_slice(&data, &[6, 8], &cuda_device)
            .transpose(0, 1)
            .unwrap();
        let cuda_parts = cuda_client.split(&cuda_tensor, 1, 2).unwrap();
        for (cpu, cuda) in cpu_parts.iter().zip(&cuda_parts) {
            assert_eq!(cpu.shape(), cuda.shape());
            assert_parity_bytes(&tensor_bytes(cpu), &tensor_bytes(cuda), "split_transposed_cuda");
        }
    });

    assert_eq!(cpu_parts[0].shape(), &[8, 3]);
}

#[test]
fn test_split_parity_invalid_arguments() {
    let (cpu_client, cpu_device) = create_cpu_client();
    let cpu_tensor = Tensor::<CpuRuntime>::from_slice(&[0.0f32; 12], &[4, 3], &cpu_device);
    let cpu_err = cpu_client.split(&cpu_tensor, 0, 3).unwrap_err().to_string();

    #[cfg(feature = "cuda")]
    with_cuda_backend(|cuda_client, cuda_device| {
        let cuda_tensor = Tensor::<CudaRuntime>::from_slice(&[0.0f32; 12], &[4, 3], &cuda_device);
        let cuda_err = cuda_client.split(&cuda_tensor, 0, 3).unwrap_err().to_string();
        assert_eq!(cpu_err, cuda_err);
    });

    assert!(cpu_err.contains("evenly divide"));
}

#[test]
fn test_split_parity_standalone_client() {
    let bytes = pattern_bytes(60, DType::F16);

    let (cpu_client, cpu_device) = create_cpu_client();
    let cpu_tensor = Tensor::<CpuRuntime>::try_from_bytes(&bytes, &[6, 10], DType::F16, &cpu_device).unwrap();
    let cpu_parts = cpu_client.split(&cpu_tensor, 1, 5).unwrap();

    #[cfg(feature = "cuda")]
    with_cuda_backend(|_, cuda_device| {
        use splitr::runtime::RuntimeClient;
        use splitr::runtime::cuda::CudaClient;

        // A client with its own stream, separate from the cached one
        let client = CudaClient::new(cuda_device.clone()).unwrap();
        let cuda_tensor =
            Tensor::<CudaRuntime>::try_from_bytes(&bytes, &[6, 10], DType::F16, &cuda_device).unwrap();
        let cuda_parts = client.split(&cuda_tensor, 1, 5).unwrap();
        client.synchronize();

        for (cpu, cuda) in cpu_parts.iter().zip(&cuda_parts) {
            assert!(cuda.storage().allocator().is_some());
            assert_parity_bytes(&tensor_bytes(cpu), &tensor_bytes(cuda), "split_standalone_client_cuda");
        }
    });

    assert_eq!(cpu_parts.len(), 5);
    assert!(cpu_parts.iter().all(|p| p.storage().allocator().is_some()));
}

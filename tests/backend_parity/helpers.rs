//! Shared helpers for backend parity tests: byte comparison, backend locks, client creation.

#[cfg(feature = "cuda")]
use crate::common::create_cuda_client;
use splitr::runtime::Runtime;
use splitr::tensor::Tensor;
#[cfg(feature = "cuda")]
use std::sync::{Mutex, OnceLock};

#[cfg(feature = "cuda")]
static CUDA_BACKEND_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Raw bytes of a tensor in row-major order, whatever its dtype
pub fn tensor_bytes<R: Runtime>(t: &Tensor<R>) -> Vec<u8> {
    match t.dtype().size_in_bytes() {
        1 => t.to_vec::<u8>(),
        2 => bytemuck::cast_slice(&t.to_vec::<u16>()).to_vec(),
        4 => bytemuck::cast_slice(&t.to_vec::<u32>()).to_vec(),
        8 => bytemuck::cast_slice(&t.to_vec::<u64>()).to_vec(),
        n => panic!("unexpected element width {}", n),
    }
}

/// Split only moves bits, so backends must agree exactly
#[allow(dead_code)]
pub fn assert_parity_bytes(a: &[u8], b: &[u8], op: &str) {
    assert_eq!(
        a.len(),
        b.len(),
        "parity_bytes[{}]: length mismatch: {} vs {}",
        op,
        a.len(),
        b.len()
    );

    if let Some(i) = a.iter().zip(b).position(|(x, y)| x != y) {
        panic!(
            "parity_bytes[{}] at byte {}: {:#04x} vs {:#04x}",
            op, i, a[i], b[i]
        );
    }
}

#[cfg(feature = "cuda")]
pub fn with_cuda_backend<F>(mut f: F)
where
    F: FnMut(splitr::runtime::cuda::CudaClient, splitr::runtime::cuda::CudaDevice),
{
    let _guard = CUDA_BACKEND_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let (client, device) =
        create_cuda_client().expect("CUDA feature is enabled but CUDA runtime is unavailable");
    f(client, device);
}

//! Split operation helpers for CPU tensors

use super::super::kernels::{StridedView3, strided_copy_3d};
use super::super::{CpuClient, CpuRuntime};
use crate::dispatch_dtype;
use crate::error::Result;
use crate::runtime::split_ops::{self, SplitExecutor, SplitParams};
use crate::tensor::Tensor;

/// General-path CPU executor: one client-allocated output and one strided
/// copy per slice, all under a single dtype dispatch
impl SplitExecutor<CpuRuntime> for CpuClient {
    fn execute_split(
        &self,
        input: &Tensor<CpuRuntime>,
        params: &SplitParams,
    ) -> Result<Vec<Tensor<CpuRuntime>>> {
        let dims = params.dims;
        let per_split = params.per_split();
        let src_dims = [dims.prefix, dims.split, dims.suffix];
        let extents = [dims.prefix, per_split, dims.suffix];

        tracing::trace!(
            prefix = dims.prefix,
            per_split,
            suffix = dims.suffix,
            num_split = params.num_split,
            "cpu split"
        );

        let mut outputs = Vec::with_capacity(params.num_split);
        for _ in 0..params.num_split {
            outputs.push(Tensor::<CpuRuntime>::try_empty_in(&params.out_shape, params.dtype, self)?);
        }
        if params.out_numel() == 0 {
            return Ok(outputs);
        }

        let src_ptr = input.data_ptr();
        dispatch_dtype!(params.dtype, T => {
            for (i, out) in outputs.iter().enumerate() {
                unsafe {
                    strided_copy_3d::<T>(
                        src_ptr as *const T,
                        StridedView3::new(src_dims, [0, i * per_split, 0]),
                        out.data_ptr() as *mut T,
                        StridedView3::full(extents),
                        extents,
                        self,
                    );
                }
            }
        }, "split");

        Ok(outputs)
    }
}

/// Split a tensor into `num_split` equal parts along `split_dim`
pub fn split_impl(
    client: &CpuClient,
    input: &Tensor<CpuRuntime>,
    split_dim: i64,
    num_split: i64,
) -> Result<Vec<Tensor<CpuRuntime>>> {
    split_ops::split_with_executor(client, input, split_dim, num_split)
}

/// Split with the axis read from a one-element integer tensor
pub fn split_with_dim_tensor_impl(
    client: &CpuClient,
    split_dim: &Tensor<CpuRuntime>,
    input: &Tensor<CpuRuntime>,
    num_split: i64,
) -> Result<Vec<Tensor<CpuRuntime>>> {
    let split_dim = split_ops::read_split_dim(split_dim)?;
    split_impl(client, input, split_dim, num_split)
}

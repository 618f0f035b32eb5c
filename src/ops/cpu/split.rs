//! CPU implementation of split operations.

use crate::error::Result;
use crate::ops::SplitOps;
use crate::runtime::cpu::{
    CpuClient, CpuRuntime,
    helpers::{split_impl, split_with_dim_tensor_impl},
};
use crate::tensor::Tensor;

/// SplitOps implementation for CPU runtime.
impl SplitOps<CpuRuntime> for CpuClient {
    fn split(
        &self,
        input: &Tensor<CpuRuntime>,
        split_dim: i64,
        num_split: i64,
    ) -> Result<Vec<Tensor<CpuRuntime>>> {
        split_impl(self, input, split_dim, num_split)
    }

    fn split_with_dim_tensor(
        &self,
        split_dim: &Tensor<CpuRuntime>,
        input: &Tensor<CpuRuntime>,
        num_split: i64,
    ) -> Result<Vec<Tensor<CpuRuntime>>> {
        split_with_dim_tensor_impl(self, split_dim, input, num_split)
    }
}

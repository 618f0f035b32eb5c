//! CUDA implementation of split operations.
//!
//! The general path makes a single kernel launch for all outputs:
//!
//! 1. allocate every output on this client's stream and record its device
//!    pointer in a host table
//! 2. allocate a device table of the same length
//! 3. enqueue the host-to-device copy of the table; the host table is released
//!    by a stream callback once that copy has run
//! 4. launch `split_<dtype>` (skipped when the outputs are empty)
//! 5. free the device table (stream-ordered) and check the stream

use crate::error::Result;
use crate::ops::SplitOps;
use crate::runtime::DeferredRelease;
use crate::runtime::cuda::kernels::launch_split;
use crate::runtime::cuda::stream::{alloc_async, check_stream_health, free_async, upload_deferred};
use crate::runtime::cuda::{CudaClient, CudaRuntime};
use crate::runtime::split_ops::{self, SplitExecutor, SplitParams};
use crate::tensor::Tensor;

/// General-path CUDA executor: one batched launch over a device pointer table
impl SplitExecutor<CudaRuntime> for CudaClient {
    fn execute_split(
        &self,
        input: &Tensor<CudaRuntime>,
        params: &SplitParams,
    ) -> Result<Vec<Tensor<CudaRuntime>>> {
        let dims = params.dims;
        tracing::trace!(
            prefix = dims.prefix,
            split = dims.split,
            suffix = dims.suffix,
            num_split = params.num_split,
            "cuda split"
        );

        let mut outputs = Vec::with_capacity(params.num_split);
        let mut out_ptrs: Vec<u64> = Vec::with_capacity(params.num_split);
        for _ in 0..params.num_split {
            let out = Tensor::<CudaRuntime>::try_empty_in(&params.out_shape, params.dtype, self)?;
            out_ptrs.push(out.data_ptr());
            outputs.push(out);
        }

        let table_bytes = out_ptrs.len() * std::mem::size_of::<u64>();
        let device_table = alloc_async(&self.stream, table_bytes)?;

        if let Err(e) = upload_deferred(&self.stream, device_table, DeferredRelease::new(out_ptrs)) {
            free_async(&self.stream, device_table);
            return Err(e);
        }

        if dims.numel() == 0 {
            free_async(&self.stream, device_table);
            return Ok(outputs);
        }

        let launched = unsafe {
            launch_split(
                &self.context,
                &self.stream,
                self.device.index,
                params.dtype,
                input.data_ptr(),
                params.num_split,
                dims,
                device_table,
            )
        };

        // Stream-ordered: released after the kernel has read the table
        free_async(&self.stream, device_table);
        launched?;

        check_stream_health(&self.stream, "split")?;
        Ok(outputs)
    }
}

/// SplitOps implementation for CUDA runtime.
impl SplitOps<CudaRuntime> for CudaClient {
    fn split(
        &self,
        input: &Tensor<CudaRuntime>,
        split_dim: i64,
        num_split: i64,
    ) -> Result<Vec<Tensor<CudaRuntime>>> {
        split_ops::split_with_executor(self, input, split_dim, num_split)
    }

    fn split_with_dim_tensor(
        &self,
        split_dim: &Tensor<CudaRuntime>,
        input: &Tensor<CudaRuntime>,
        num_split: i64,
    ) -> Result<Vec<Tensor<CudaRuntime>>> {
        let split_dim = split_ops::read_split_dim(split_dim)?;
        self.split(input, split_dim, num_split)
    }
}

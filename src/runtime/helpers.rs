//! Helpers shared by the backend split implementations

use crate::error::Result;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// `tensor` itself when it is dense and row-major, otherwise a packed copy on
/// the same device.
///
/// The general split path indexes its input as a flat `[before, axis, after]`
/// block, so strided inputs go through here first.
#[inline]
pub fn ensure_contiguous<R: Runtime>(tensor: &Tensor<R>) -> Result<Tensor<R>> {
    tensor.try_contiguous()
}

//! Equal-part split operation trait.

use crate::error::Result;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Split a tensor into equal parts along one axis
pub trait SplitOps<R: Runtime> {
    /// Split `input` into `num_split` equal parts along `split_dim`
    ///
    /// Output `i` holds the elements `[i * delta, (i + 1) * delta)` along
    /// `split_dim`, where `delta = input.shape()[split_dim] / num_split`.
    /// Every output has the input's dtype and rank.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor to split
    /// * `split_dim` - Axis to split, in `[0, input.ndim())`. Negative values are
    ///   rejected, not wrapped.
    /// * `num_split` - Number of outputs, must be positive and divide the axis size
    ///
    /// # Aliasing
    ///
    /// - `num_split == 1` returns `input` itself (shared storage).
    /// - Splitting axis 0 of a contiguous input whose rows are a multiple of
    ///   `R::alignment()` bytes returns views into the input.
    /// - Every other case returns freshly allocated contiguous tensors.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a bad axis, a non-positive `num_split`, or an
    ///   axis size not divisible by `num_split`
    /// - `OutOfMemory` if an output cannot be allocated
    /// - `Internal` if a device kernel fails to launch
    ///
    /// # Example
    ///
    /// ```ignore
    /// let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], &device);
    /// let parts = client.split(&a, 1, 3)?; // three [2, 1] tensors
    /// ```
    fn split(&self, input: &Tensor<R>, split_dim: i64, num_split: i64) -> Result<Vec<Tensor<R>>>;

    /// Split with the axis given as a one-element `I32` or `I64` tensor
    ///
    /// The axis is read on the host, then this behaves as [`split`](Self::split).
    /// Any other dtype or element count is `InvalidArgument`.
    fn split_with_dim_tensor(
        &self,
        split_dim: &Tensor<R>,
        input: &Tensor<R>,
        num_split: i64,
    ) -> Result<Vec<Tensor<R>>>;
}

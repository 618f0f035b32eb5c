//! Shared split utilities for all backends
//!
//! Splitting a tensor into `num_split` equal parts is the same problem on every
//! backend once the shape has been collapsed to three axes:
//!
//! ```text
//! [d0, ..., d(k-1), dk, d(k+1), ..., dn]   split_dim = k
//!  \_____prefix___/  split \____suffix___/
//! ```
//!
//! Output `i` holds `input[p, i*per_split .. (i+1)*per_split, s]` for every
//! prefix index `p` and suffix index `s`.
//!
//! This module implements once:
//! - argument validation and geometry ([`validate_split`], [`SplitDims`])
//! - zero-copy fast paths ([`detect_fast_path`], [`split_fast_path`])
//! - the driver every backend goes through ([`split_with_executor`])
//!
//! Backends only provide the copying half through [`SplitExecutor`].

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{Runtime, ensure_contiguous};
use crate::tensor::Tensor;
use tracing::{debug, trace};

// ============================================================================
// Geometry
// ============================================================================

/// A shape collapsed around the split axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDims {
    /// Product of the dimensions before the split axis (1 if none)
    pub prefix: usize,
    /// Size of the split axis
    pub split: usize,
    /// Product of the dimensions after the split axis (1 if none)
    pub suffix: usize,
}

impl SplitDims {
    /// Collapse `shape` around `split_dim`.
    ///
    /// `split_dim` must be a valid axis of `shape`.
    pub fn collapse(shape: &[usize], split_dim: usize) -> Self {
        Self {
            prefix: shape[..split_dim].iter().product(),
            split: shape[split_dim],
            suffix: shape[split_dim + 1..].iter().product(),
        }
    }

    /// Size of the split axis in each output
    #[inline]
    pub fn per_split(&self, num_split: usize) -> usize {
        self.split / num_split
    }

    /// Total element count described by the three axes
    #[inline]
    pub fn numel(&self) -> usize {
        self.prefix * self.split * self.suffix
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validated split request
#[derive(Debug, Clone)]
pub struct SplitParams {
    /// Axis to split along
    pub split_dim: usize,
    /// Number of outputs
    pub num_split: usize,
    /// Input shape collapsed around `split_dim`
    pub dims: SplitDims,
    /// Shape shared by every output
    pub out_shape: Vec<usize>,
    /// Element type of input and outputs
    pub dtype: DType,
}

impl SplitParams {
    /// Size of the split axis in each output
    #[inline]
    pub fn per_split(&self) -> usize {
        self.dims.per_split(self.num_split)
    }

    /// Element count of each output
    #[inline]
    pub fn out_numel(&self) -> usize {
        self.dims.prefix * self.per_split() * self.dims.suffix
    }
}

/// Validate a split request and compute its geometry.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. `0 <= split_dim < shape.len()` (negative axes are not normalised)
/// 2. `num_split > 0`
/// 3. the split axis size is divisible by `num_split`
///
/// All three fail with [`Error::InvalidArgument`]. Nothing is allocated.
pub fn validate_split(
    shape: &[usize],
    dtype: DType,
    split_dim: i64,
    num_split: i64,
) -> Result<SplitParams> {
    let ndim = shape.len();
    if split_dim < 0 || split_dim >= ndim as i64 {
        return Err(Error::invalid_argument(
            "split_dim",
            format!(
                "0 <= split_dim < number of input dimensions ({}), but got {}",
                ndim, split_dim
            ),
        ));
    }
    let split_dim = split_dim as usize;

    if num_split <= 0 {
        return Err(Error::invalid_argument(
            "num_split",
            format!(
                "Number of ways to split should be > 0, but got {}",
                num_split
            ),
        ));
    }
    let num_split = usize::try_from(num_split).map_err(|_| {
        Error::invalid_argument(
            "num_split",
            format!("Number of ways to split does not fit in usize: {}", num_split),
        )
    })?;

    let dims = SplitDims::collapse(shape, split_dim);
    if dims.split % num_split != 0 {
        return Err(Error::invalid_argument(
            "num_split",
            format!(
                "Number of ways to split should evenly divide the split dimension, \
                 but got split_dim {} (size = {}) and num_split {}",
                split_dim, dims.split, num_split
            ),
        ));
    }

    let mut out_shape = shape.to_vec();
    out_shape[split_dim] = dims.per_split(num_split);

    Ok(SplitParams {
        split_dim,
        num_split,
        dims,
        out_shape,
        dtype,
    })
}

/// Read a split axis stored in a one-element `I32` or `I64` tensor.
///
/// The value is read on the host. Any other dtype or element count is
/// [`Error::InvalidArgument`].
pub fn read_split_dim<R: Runtime>(split_dim: &Tensor<R>) -> Result<i64> {
    if split_dim.numel() != 1 {
        return Err(Error::invalid_argument(
            "split_dim",
            format!(
                "split_dim tensor must hold exactly one element, but has shape {:?}",
                split_dim.shape()
            ),
        ));
    }

    match split_dim.dtype() {
        DType::I32 => Ok(i64::from(split_dim.item::<i32>()?)),
        DType::I64 => split_dim.item::<i64>(),
        other => Err(Error::invalid_argument(
            "split_dim",
            format!("split_dim tensor must be I32 or I64, but got {}", other),
        )),
    }
}

// ============================================================================
// Fast paths
// ============================================================================

/// A split that can be answered without copying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPath {
    /// `num_split == 1`: the output is the input
    Identity,
    /// Split along axis 0 of an aligned contiguous input: outputs are
    /// consecutive row ranges of `delta` rows each
    SliceDim0 {
        /// Rows per output
        delta: usize,
    },
}

/// Decide whether `input` can be split without copying.
///
/// The dim-0 slice is taken only when every output would start on a
/// `R::alignment()` byte boundary, i.e. when the input is contiguous, its
/// storage offset is aligned, and one row of the inner dimensions is a whole
/// multiple of the alignment. Pure: reads only shapes and strides.
pub fn detect_fast_path<R: Runtime>(input: &Tensor<R>, params: &SplitParams) -> Option<FastPath> {
    if params.num_split == 1 {
        return Some(FastPath::Identity);
    }
    if params.split_dim != 0 || !input.is_contiguous() {
        return None;
    }

    let align = R::alignment();
    let elem_size = params.dtype.size_in_bytes();
    let row_bytes = params.dims.suffix * elem_size;
    let offset_bytes = input.layout().offset() * elem_size;
    if row_bytes % align != 0 || offset_bytes % align != 0 {
        return None;
    }

    Some(FastPath::SliceDim0 {
        delta: params.per_split(),
    })
}

/// Produce the outputs of a fast path as views sharing `input`'s storage.
pub fn split_fast_path<R: Runtime>(
    input: &Tensor<R>,
    params: &SplitParams,
    fast: FastPath,
) -> Result<Vec<Tensor<R>>> {
    match fast {
        FastPath::Identity => {
            debug!("split identity");
            Ok(vec![input.clone()])
        }
        FastPath::SliceDim0 { delta } => {
            debug!(shape = ?input.shape(), "split slice dim 0");
            (0..params.num_split)
                .map(|i| input.narrow(0, i * delta, delta))
                .collect()
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Backend half of a split: copy every slice of a contiguous input into
/// freshly allocated outputs.
pub trait SplitExecutor<R: Runtime> {
    /// Copy all `params.num_split` slices of `input`.
    ///
    /// `input` is contiguous and no fast path applies. Outputs must be
    /// returned in split-axis order, each with shape `params.out_shape`.
    fn execute_split(&self, input: &Tensor<R>, params: &SplitParams) -> Result<Vec<Tensor<R>>>;
}

/// Split `input` into `num_split` equal parts along `split_dim`.
///
/// Validates, tries the fast paths, and otherwise hands a contiguous input to
/// `executor`.
pub fn split_with_executor<R, E>(
    executor: &E,
    input: &Tensor<R>,
    split_dim: i64,
    num_split: i64,
) -> Result<Vec<Tensor<R>>>
where
    R: Runtime,
    E: SplitExecutor<R>,
{
    let params = validate_split(input.shape(), input.dtype(), split_dim, num_split)?;

    if let Some(fast) = detect_fast_path(input, &params) {
        return split_fast_path(input, &params, fast);
    }

    trace!(
        runtime = R::name(),
        prefix = params.dims.prefix,
        split = params.dims.split,
        suffix = params.dims.suffix,
        num_split = params.num_split,
        "split general path"
    );

    let input = ensure_contiguous(input)?;
    executor.execute_split(&input, &params)
}

//! Crate-wide error type

use crate::dtype::DType;
use thiserror::Error;

/// `Result` with [`enum@Error`] as the error type
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a splitr call can fail with
///
/// Argument problems in a split surface as [`Error::InvalidArgument`] carrying
/// the exact reason text; device trouble as [`Error::Backend`] or
/// [`Error::Internal`].
#[derive(Error, Debug)]
pub enum Error {
    /// Element count or shape does not fit what the call needs
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// What the call needed
        expected: Vec<usize>,
        /// What it was given
        got: Vec<usize>,
    },

    /// Axis outside `-ndim..ndim` in a view operation
    #[error("dimension {dim} out of range for a rank-{ndim} tensor")]
    InvalidDimension {
        /// Axis as passed in
        dim: isize,
        /// Rank of the tensor
        ndim: usize,
    },

    /// No implementation of `op` for `dtype`
    #[error("dtype {dtype} is not supported by '{op}'")]
    UnsupportedDType {
        /// Element type of the input
        dtype: DType,
        /// Operation name
        op: &'static str,
    },

    /// The device could not hand out `size` bytes
    #[error("out of memory allocating {size} bytes")]
    OutOfMemory {
        /// Requested bytes (`usize::MAX` when the size itself overflowed)
        size: usize,
    },

    /// A caller-supplied argument was rejected
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Parameter name
        arg: &'static str,
        /// Human-readable reason; stable text for split validation
        reason: String,
    },

    /// The call needs a dense row-major view
    #[error("tensor is not contiguous")]
    NotContiguous,

    /// A runtime call into the device failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Raw CUDA driver failure
    #[cfg(feature = "cuda")]
    #[error("CUDA driver error: {0}")]
    Cuda(#[from] cudarc::driver::DriverError),

    /// Broken internal assumption, or a kernel that failed after launch
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// [`Error::ShapeMismatch`] from borrowed shapes
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// [`Error::InvalidArgument`] for parameter `arg`
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// [`Error::UnsupportedDType`]
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// True for [`Error::InvalidArgument`]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::invalid_argument("num_split", "Number of ways to split should be > 0, but got 0");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "invalid argument 'num_split': Number of ways to split should be > 0, but got 0"
        );
    }

    #[test]
    fn test_display_names_dtype_and_size() {
        assert_eq!(
            Error::OutOfMemory { size: 1024 }.to_string(),
            "out of memory allocating 1024 bytes"
        );
        let err = Error::unsupported_dtype(DType::BF16, "split");
        assert!(!err.is_invalid_argument());
        assert_eq!(err.to_string(), "dtype bf16 is not supported by 'split'");
    }
}

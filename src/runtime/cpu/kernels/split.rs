//! 3D strided copy kernel used by the split executor
//!
//! Both sides of the copy are row-major 3D buffers described by a
//! [`StridedView3`]. A copy moves an `extents` sized box from one view into the
//! other. The innermost axis is contiguous on both sides, so each
//! `(outer, middle)` pair is one `memcpy` of `extents[2]` elements.

use crate::dtype::Element;
use crate::runtime::cpu::CpuClient;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Rows below this many elements are not worth a rayon task on their own
#[cfg(feature = "rayon")]
const PAR_MIN_ELEMENTS: usize = 4096;

/// A window into a row-major 3D buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedView3 {
    /// Full dimensions of the underlying buffer
    pub dims: [usize; 3],
    /// Index of the first element of the window
    pub start: [usize; 3],
}

impl StridedView3 {
    /// Window starting at `start` inside a buffer of `dims`
    pub fn new(dims: [usize; 3], start: [usize; 3]) -> Self {
        Self { dims, start }
    }

    /// Window covering a whole buffer of `dims`
    pub fn full(dims: [usize; 3]) -> Self {
        Self {
            dims,
            start: [0, 0, 0],
        }
    }

    /// Whether an `extents` box starting at `start` fits inside `dims`
    pub fn contains(&self, extents: [usize; 3]) -> bool {
        (0..3).all(|axis| self.start[axis] + extents[axis] <= self.dims[axis])
    }

    /// Linear offset of window element `(a, b, 0)`
    #[inline]
    fn row_offset(&self, a: usize, b: usize) -> usize {
        ((self.start[0] + a) * self.dims[1] + self.start[1] + b) * self.dims[2] + self.start[2]
    }
}

/// Copy an `extents` box from `src_view` of `src` into `dst_view` of `dst`.
///
/// Rows are distributed over the client's rayon pool when the `rayon` feature
/// is enabled.
///
/// # Safety
/// - `src` must be valid for reads of `src_view.dims` elements
/// - `dst` must be valid for writes of `dst_view.dims` elements
/// - both views must contain `extents`
/// - the destination box must not overlap the source box
pub unsafe fn strided_copy_3d<T: Element>(
    src: *const T,
    src_view: StridedView3,
    dst: *mut T,
    dst_view: StridedView3,
    extents: [usize; 3],
    client: &CpuClient,
) {
    debug_assert!(src_view.contains(extents));
    debug_assert!(dst_view.contains(extents));

    let rows = extents[0] * extents[1];
    let row_len = extents[2];
    if rows == 0 || row_len == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        if rows > 1 && rows * row_len >= PAR_MIN_ELEMENTS {
            unsafe { strided_copy_3d_parallel(src, src_view, dst, dst_view, extents, client) };
            return;
        }
    }

    #[cfg(not(feature = "rayon"))]
    let _ = client;

    for row in 0..rows {
        unsafe { copy_row(src, src_view, dst, dst_view, extents, row) };
    }
}

#[cfg(feature = "rayon")]
unsafe fn strided_copy_3d_parallel<T: Element>(
    src: *const T,
    src_view: StridedView3,
    dst: *mut T,
    dst_view: StridedView3,
    extents: [usize; 3],
    client: &CpuClient,
) {
    let rows = extents[0] * extents[1];
    let min_len = client
        .rayon_min_len()
        .max(PAR_MIN_ELEMENTS.div_ceil(extents[2]));
    let src_addr = src as usize;
    let dst_addr = dst as usize;

    client.install_parallelism(|| {
        (0..rows)
            .into_par_iter()
            .with_min_len(min_len)
            .for_each(|row| unsafe {
                copy_row(
                    src_addr as *const T,
                    src_view,
                    dst_addr as *mut T,
                    dst_view,
                    extents,
                    row,
                );
            });
    });
}

#[inline]
unsafe fn copy_row<T: Element>(
    src: *const T,
    src_view: StridedView3,
    dst: *mut T,
    dst_view: StridedView3,
    extents: [usize; 3],
    row: usize,
) {
    let a = row / extents[1];
    let b = row % extents[1];
    unsafe {
        std::ptr::copy_nonoverlapping(
            src.add(src_view.row_offset(a, b)),
            dst.add(dst_view.row_offset(a, b)),
            extents[2],
        );
    }
}

//! Where a tensor's elements sit inside its storage

use smallvec::SmallVec;

/// Inline capacity; ranks above this spill to the heap
type Dims<T> = SmallVec<[T; 4]>;

/// Shape, element strides and element offset of a view
///
/// Element `[i0, .., ik]` lives at `offset + i0 * strides[0] + .. + ik * strides[k]`
/// elements from the start of the storage. Strides are counted in elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Dims<usize>,
    strides: Dims<isize>,
    offset: usize,
}

impl Layout {
    /// Row-major layout over `shape`, starting at element 0
    ///
    /// ```
    /// use splitr::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let mut strides: Dims<isize> = SmallVec::from_elem(1, shape.len());
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1].max(1) as isize;
        }
        Self {
            shape: shape.iter().copied().collect(),
            strides,
            offset: 0,
        }
    }

    /// Extent of each axis
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis step, in elements
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Index of the first viewed element in the storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Element count; 1 for a scalar
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the view walks its elements densely in row-major order.
    ///
    /// The offset does not matter, and neither do strides of extent-1 axes.
    /// Any view with a zero extent is contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.shape.contains(&0) {
            return true;
        }
        let mut dense = 1isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if extent > 1 && stride != dense {
                return false;
            }
            dense *= extent as isize;
        }
        true
    }

    /// Map a possibly negative axis (`-1` is the last) to `0..ndim`
    pub fn resolve_dim(&self, dim: isize) -> Option<usize> {
        let rank = self.ndim() as isize;
        let axis = if dim < 0 { dim + rank } else { dim };
        (0..rank).contains(&axis).then_some(axis as usize)
    }

    /// Same storage with axes `a` and `b` exchanged
    pub fn transpose(&self, a: isize, b: isize) -> Option<Self> {
        let (a, b) = (self.resolve_dim(a)?, self.resolve_dim(b)?);
        let mut swapped = self.clone();
        swapped.shape.swap(a, b);
        swapped.strides.swap(a, b);
        Some(swapped)
    }

    /// Row-major relayout over `shape`, keeping the offset.
    ///
    /// `None` unless this view is contiguous and holds the same element count.
    pub fn reshape(&self, shape: &[usize]) -> Option<Self> {
        if !self.is_contiguous() || shape.iter().product::<usize>() != self.numel() {
            return None;
        }
        Some(Self {
            offset: self.offset,
            ..Self::contiguous(shape)
        })
    }

    /// Restrict resolved axis `dim` to the window `start..start + length`.
    ///
    /// `None` when the axis or the window is out of range.
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Option<Self> {
        let extent = *self.shape.get(dim)?;
        if start.checked_add(length)? > extent {
            return None;
        }

        let mut window = self.clone();
        window.shape[dim] = length;
        if length > 0 {
            let first = self.offset as isize + start as isize * self.strides[dim];
            window.offset = usize::try_from(first).ok()?;
        }
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_strides() {
        let layout = Layout::contiguous(&[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert_eq!(layout.numel(), 24);
        assert!(layout.is_contiguous());

        let scalar = Layout::contiguous(&[]);
        assert_eq!(scalar.ndim(), 0);
        assert_eq!(scalar.numel(), 1);
        assert!(scalar.is_contiguous());
    }

    #[test]
    fn test_zero_extent_strides_stay_positive() {
        let layout = Layout::contiguous(&[3, 0, 4]);
        assert_eq!(layout.strides(), &[4, 4, 1]);
        assert_eq!(layout.numel(), 0);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_resolve_dim() {
        let layout = Layout::contiguous(&[2, 3]);
        assert_eq!(layout.resolve_dim(-1), Some(1));
        assert_eq!(layout.resolve_dim(1), Some(1));
        assert_eq!(layout.resolve_dim(2), None);
        assert_eq!(layout.resolve_dim(-3), None);
    }

    #[test]
    fn test_transpose_breaks_contiguity() {
        let transposed = Layout::contiguous(&[2, 3, 4]).transpose(-1, -2).unwrap();
        assert_eq!(transposed.shape(), &[2, 4, 3]);
        assert_eq!(transposed.strides(), &[12, 1, 4]);
        assert!(!transposed.is_contiguous());
    }

    #[test]
    fn test_narrow_outer_dim_stays_contiguous() {
        let narrowed = Layout::contiguous(&[6, 4]).narrow(0, 2, 2).unwrap();
        assert_eq!(narrowed.shape(), &[2, 4]);
        assert_eq!(narrowed.offset(), 8);
        assert!(narrowed.is_contiguous());
    }

    #[test]
    fn test_narrow_inner_dim_is_strided() {
        let narrowed = Layout::contiguous(&[2, 6]).narrow(1, 3, 3).unwrap();
        assert_eq!(narrowed.strides(), &[6, 1]);
        assert_eq!(narrowed.offset(), 3);
        assert!(!narrowed.is_contiguous());
    }

    #[test]
    fn test_narrow_out_of_range() {
        let layout = Layout::contiguous(&[4, 3]);
        assert!(layout.narrow(0, 3, 2).is_none());
        assert!(layout.narrow(2, 0, 1).is_none());
        assert_eq!(layout.narrow(0, 4, 0).unwrap().offset(), 0);
    }

    #[test]
    fn test_reshape_keeps_offset() {
        let window = Layout::contiguous(&[4, 3]).narrow(0, 1, 2).unwrap();
        let flat = window.reshape(&[6]).unwrap();
        assert_eq!(flat.offset(), 3);
        assert!(window.reshape(&[5]).is_none());
    }
}

//! The `Tensor` handle

use super::{Layout, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// A strided view over device storage
///
/// Cloning, `narrow`, `transpose` and `reshape` never touch element data;
/// they return a new [`Layout`] over the same [`Storage`]. The dim-0 split
/// fast path hands out such views, which [`shares_storage`](Self::shares_storage)
/// can detect.
///
/// ```
/// use splitr::prelude::*;
///
/// let device = CpuDevice::new();
/// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
/// let bottom = a.narrow(0, 1, 1).unwrap();
/// assert!(bottom.shares_storage(&a));
/// assert_eq!(bottom.to_vec::<f32>(), [3.0, 4.0]);
/// ```
pub struct Tensor<R: Runtime> {
    storage: Storage<R>,
    layout: Layout,
}

fn checked_numel(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(Error::OutOfMemory { size: usize::MAX })
}

impl<R: Runtime> Tensor<R> {
    fn view(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    fn dense(storage: Storage<R>, shape: &[usize]) -> Self {
        Self {
            storage,
            layout: Layout::contiguous(shape),
        }
    }

    /// Upload `data` as a row-major tensor of `shape`.
    ///
    /// # Panics
    ///
    /// Panics when `data.len()` is not the product of `shape` or the upload
    /// fails; [`try_from_slice`](Self::try_from_slice) returns the error.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        match Self::try_from_slice(data, shape, device) {
            Ok(tensor) => tensor,
            Err(e) => panic!("Tensor::from_slice: {}", e),
        }
    }

    /// Fallible [`from_slice`](Self::from_slice)
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Result<Self> {
        if data.len() != checked_numel(shape)? {
            return Err(Error::shape_mismatch(shape, &[data.len()]));
        }
        Ok(Self::dense(Storage::from_slice(data, device)?, shape))
    }

    /// Upload raw bytes as a row-major tensor of `dtype`.
    ///
    /// The way to build `Bool` tensors, and half-precision ones when the
    /// `f16` feature is off.
    pub fn try_from_bytes(data: &[u8], shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let numel = checked_numel(shape)?;
        let width = dtype.size_in_bytes();
        if data.len() != numel * width {
            return Err(Error::shape_mismatch(shape, &[data.len() / width]));
        }
        Ok(Self::dense(Storage::from_bytes(data, dtype, device)?, shape))
    }

    /// Allocate a row-major tensor with unspecified contents.
    ///
    /// # Panics
    ///
    /// Panics when the allocation fails; see [`try_empty`](Self::try_empty).
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        match Self::try_empty(shape, dtype, device) {
            Ok(tensor) => tensor,
            Err(e) => panic!("Tensor::empty: {}", e),
        }
    }

    /// Fallible [`empty`](Self::empty); `OutOfMemory` on overflow or device exhaustion
    pub fn try_empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let storage = Storage::new(checked_numel(shape)?, dtype, device)?;
        Ok(Self::dense(storage, shape))
    }

    /// [`try_empty`](Self::try_empty) through `client`'s allocator.
    ///
    /// Operations allocate their outputs this way, so on CUDA the memory is
    /// ordered on the same stream as the kernels that fill it.
    pub fn try_empty_in(shape: &[usize], dtype: DType, client: &R::Client) -> Result<Self> {
        let storage = Storage::new_in(checked_numel(shape)?, dtype, client)?;
        Ok(Self::dense(storage, shape))
    }

    /// Backing allocation
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// View geometry
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Extent of each axis
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Element strides of each axis
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Element count
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Device holding the storage
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// True when the elements are dense and row-major
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Address of the first viewed element
    #[inline]
    pub fn data_ptr(&self) -> u64 {
        let skipped = self.layout.offset() * self.dtype().size_in_bytes();
        self.storage.ptr() + skipped as u64
    }

    /// True when both tensors view the same allocation
    #[inline]
    pub fn shares_storage(&self, other: &Self) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// View with axes `dim0` and `dim1` exchanged
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Result<Self> {
        match self.layout.transpose(dim0, dim1) {
            Some(layout) => Ok(self.view(layout)),
            None => {
                let bad = if self.layout.resolve_dim(dim0).is_none() { dim0 } else { dim1 };
                Err(Error::InvalidDimension {
                    dim: bad,
                    ndim: self.ndim(),
                })
            }
        }
    }

    /// View with a new shape; only contiguous tensors can be reshaped
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        if !self.is_contiguous() {
            return Err(Error::NotContiguous);
        }
        let layout = self
            .layout
            .reshape(shape)
            .ok_or_else(|| Error::shape_mismatch(self.shape(), shape))?;
        Ok(self.view(layout))
    }

    /// View of `length` entries of axis `dim` starting at `start`
    ///
    /// For `[4, 5, 6]`, `narrow(1, 1, 3)` gives `[4, 3, 6]`.
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Result<Self> {
        let axis = self.layout.resolve_dim(dim).ok_or(Error::InvalidDimension {
            dim,
            ndim: self.ndim(),
        })?;
        let layout = self
            .layout
            .narrow(axis, start, length)
            .ok_or_else(|| Error::shape_mismatch(&[self.shape()[axis]], &[start, length]))?;
        Ok(self.view(layout))
    }

    /// Dense copy, or `self` again when already contiguous.
    ///
    /// # Panics
    ///
    /// Panics when the copy fails; see [`try_contiguous`](Self::try_contiguous).
    pub fn contiguous(&self) -> Self {
        match self.try_contiguous() {
            Ok(tensor) => tensor,
            Err(e) => panic!("Tensor::contiguous: {}", e),
        }
    }

    /// Fallible [`contiguous`](Self::contiguous); gathers through
    /// [`Runtime::copy_strided`] into fresh storage.
    pub fn try_contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }

        let width = self.dtype().size_in_bytes();
        let packed = Storage::new(self.numel(), self.dtype(), self.device())?;
        R::copy_strided(
            self.storage.ptr(),
            self.layout.offset() * width,
            packed.ptr(),
            self.shape(),
            self.strides(),
            width,
            self.device(),
        )?;
        Ok(Self::dense(packed, self.shape()))
    }

    /// Read the elements back in row-major order.
    ///
    /// # Panics
    ///
    /// Panics when `T` has the wrong width or the read fails; see
    /// [`try_to_vec`](Self::try_to_vec).
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        match self.try_to_vec() {
            Ok(values) => values,
            Err(e) => panic!("Tensor::to_vec: {}", e),
        }
    }

    /// Fallible [`to_vec`](Self::to_vec)
    ///
    /// `T` only has to match the element width, so `u8` reads `Bool` tensors
    /// and `u16` reads half-precision ones.
    pub fn try_to_vec<T: bytemuck::Pod>(&self) -> Result<Vec<T>> {
        if std::mem::size_of::<T>() != self.dtype().size_in_bytes() {
            return Err(Error::unsupported_dtype(self.dtype(), "to_vec"));
        }

        let dense = self.try_contiguous()?;
        let mut host = vec![T::zeroed(); dense.numel()];
        R::copy_from_device(dense.data_ptr(), bytemuck::cast_slice_mut(&mut host), dense.device())?;
        Ok(host)
    }

    /// The single element of a one-element tensor
    pub fn item<T: bytemuck::Pod>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::shape_mismatch(&[1], self.shape()));
        }
        self.try_to_vec::<T>()?
            .pop()
            .ok_or_else(|| Error::Internal("item() read no element".to_string()))
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    fn clone(&self) -> Self {
        self.view(self.layout.clone())
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor<{}>({:?}, {}, offset={}{})",
            R::name(),
            self.shape(),
            self.dtype(),
            self.layout.offset(),
            if self.is_contiguous() { "" } else { ", strided" }
        )
    }
}

impl<R: Runtime> fmt::Display for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.dtype(), self.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_from_slice() {
        let device = CpuDevice::new();
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 3], &device);

        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.dtype(), DType::F32);
        assert!(tensor.is_contiguous());
        assert_eq!(tensor.to_vec::<f32>(), data);
        assert_eq!(tensor.to_string(), "f32[2, 3]");
    }

    #[test]
    fn test_from_slice_length_mismatch() {
        let device = CpuDevice::new();
        let result = Tensor::<CpuRuntime>::try_from_slice(&[1.0f32, 2.0, 3.0], &[2, 2], &device);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_narrow_dim0_view_reads_window() {
        let device = CpuDevice::new();
        let data: Vec<i32> = (0..12).collect();
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[4, 3], &device);

        let view = tensor.narrow(0, 2, 2).unwrap();
        assert!(view.shares_storage(&tensor));
        assert!(view.is_contiguous());
        assert_eq!(view.data_ptr(), tensor.data_ptr() + 24);
        assert_eq!(view.to_vec::<i32>(), [6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_narrow_inner_dim_reads_through_copy() {
        let device = CpuDevice::new();
        let data: Vec<i32> = (0..12).collect();
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 6], &device);

        let view = tensor.narrow(-1, 3, 3).unwrap();
        assert!(!view.is_contiguous());
        assert_eq!(view.to_vec::<i32>(), [3, 4, 5, 9, 10, 11]);
    }

    #[test]
    fn test_narrow_bad_axis() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[0u8; 4], &[2, 2], &device);
        assert!(matches!(
            tensor.narrow(2, 0, 1),
            Err(Error::InvalidDimension { dim: 2, ndim: 2 })
        ));
        assert!(matches!(tensor.transpose(0, -3), Err(Error::InvalidDimension { dim: -3, .. })));
    }

    #[test]
    fn test_contiguous_from_transpose() {
        let device = CpuDevice::new();
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 3], &device);

        let transposed = tensor.transpose(0, 1).unwrap();
        assert!(!transposed.is_contiguous());
        assert!(transposed.reshape(&[6]).is_err());

        let packed = transposed.contiguous();
        assert!(packed.is_contiguous());
        assert!(!packed.shares_storage(&tensor));
        assert_eq!(packed.shape(), &[3, 2]);
        assert_eq!(packed.to_vec::<f32>(), [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_bool_from_bytes() {
        let device = CpuDevice::new();
        let tensor =
            Tensor::<CpuRuntime>::try_from_bytes(&[1, 0, 0, 1], &[2, 2], DType::Bool, &device)
                .unwrap();
        assert_eq!(tensor.dtype(), DType::Bool);
        assert_eq!(tensor.to_vec::<u8>(), [1, 0, 0, 1]);
    }

    #[test]
    fn test_item() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[7i64], &[], &device);
        assert_eq!(tensor.item::<i64>().unwrap(), 7);

        let tensor = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0], &[2], &device);
        assert!(tensor.item::<f32>().is_err());
    }

    #[test]
    fn test_to_vec_width_mismatch() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[1.0f64], &[1], &device);
        assert!(tensor.try_to_vec::<f32>().is_err());
    }
}

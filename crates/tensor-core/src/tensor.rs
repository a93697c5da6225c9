// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Owned tensors and the borrowed views kernels operate on.

use crate::{AlignedBuf, DType, Shape, TensorError};

/// An owned, n-dimensional tensor stored in contiguous, aligned memory.
///
/// The interpreter itself never allocates `Tensor`s: activations live in
/// the scratch arena and weights live in the model blob. `Tensor` is the
/// convenient owner for test vectors, fixtures and benchmarks.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat byte buffer.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: AlignedBuf,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            data: AlignedBuf::zeroed(size),
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: &[u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            dtype,
            data: AlignedBuf::from_bytes(data),
        })
    }

    /// Creates a tensor from a slice of `f32` values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_f32_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::F32, bytemuck::cast_slice(values))
    }

    /// Creates a tensor from a slice of `i8` values.
    pub fn from_i8(shape: Shape, values: &[i8]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::I8, bytemuck::cast_slice(values))
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            dtype: self.dtype,
            data: self.data.as_bytes(),
        }
    }

    /// Returns a mutable view over this tensor's data.
    pub fn view_mut(&mut self) -> TensorViewMut<'_> {
        TensorViewMut {
            shape: &self.shape,
            dtype: self.dtype,
            data: self.data.as_bytes_mut(),
        }
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Interprets the buffer as a slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice(&self) -> &[f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice called on {:?} tensor",
            self.dtype
        );
        bytemuck::cast_slice(self.data.as_bytes())
    }
}

/// A borrowed, read-only view over tensor data owned elsewhere.
///
/// Views are zero-copy and tied to the lifetime of the backing memory,
/// enforced by the borrow checker.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Creates a view from raw parts, checking the byte length.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the length of the view in bytes.
    pub fn bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the data as `f32`, checking dtype and alignment.
    pub fn f32_data(&self, op: &'static str) -> Result<&'a [f32], TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op,
                dtype: self.dtype,
            });
        }
        bytemuck::try_cast_slice(self.data).map_err(|e| TensorError::Misaligned {
            op,
            detail: format!("{e:?}"),
        })
    }

    /// Returns the data as `i8`, checking dtype.
    pub fn i8_data(&self, op: &'static str) -> Result<&'a [i8], TensorError> {
        if self.dtype != DType::I8 {
            return Err(TensorError::UnsupportedDType {
                op,
                dtype: self.dtype,
            });
        }
        Ok(bytemuck::cast_slice(self.data))
    }
}

/// A borrowed, writable view over tensor data owned elsewhere.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Creates a mutable view from raw parts, checking the byte length.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a mut [u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the length of the view in bytes.
    pub fn bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw byte slice for writing.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape,
            dtype: self.dtype,
            data: &*self.data,
        }
    }

    /// Returns the data as mutable `f32`, checking dtype and alignment.
    pub fn f32_data_mut(&mut self, op: &'static str) -> Result<&mut [f32], TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op,
                dtype: self.dtype,
            });
        }
        bytemuck::try_cast_slice_mut(&mut *self.data).map_err(|e| TensorError::Misaligned {
            op,
            detail: format!("{e:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert_eq!(t.dtype(), DType::F32);
        assert!(t.as_f32_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_f32() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_f32(Shape::matrix(2, 3), &data).unwrap();
        assert_eq!(t.as_f32_slice(), &data);
    }

    #[test]
    fn test_from_bytes_size_mismatch() {
        let result = Tensor::from_bytes(Shape::matrix(2, 3), DType::F32, &[0u8; 10]);
        assert!(matches!(
            result,
            Err(TensorError::BufferSizeMismatch { expected: 24, actual: 10 })
        ));
    }

    #[test]
    fn test_view_lifetime() {
        let t = Tensor::from_f32(Shape::vector(4), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let v = t.view();
        assert_eq!(v.shape(), &Shape::vector(4));
        assert_eq!(v.bytes(), 16);
        assert_eq!(v.f32_data("test").unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_view_dtype_checked() {
        let t = Tensor::from_i8(Shape::vector(2), &[-1, 5]).unwrap();
        assert!(matches!(
            t.view().f32_data("test"),
            Err(TensorError::UnsupportedDType { .. })
        ));
        assert_eq!(t.view().i8_data("test").unwrap(), &[-1, 5]);
    }

    #[test]
    fn test_view_mut_write() {
        let mut t = Tensor::zeros(Shape::vector(3), DType::F32);
        {
            let mut v = t.view_mut();
            let slice = v.f32_data_mut("test").unwrap();
            slice[0] = 10.0;
            slice[2] = 30.0;
        }
        assert_eq!(t.as_f32_slice(), &[10.0, 0.0, 30.0]);
    }

    #[test]
    fn test_view_new_checks_length() {
        let shape = Shape::vector(3);
        let bytes = [0u8; 8];
        assert!(TensorView::new(&shape, DType::F32, &bytes).is_err());
        let mut bytes = [0u8; 3];
        assert!(TensorViewMut::new(&shape, DType::I8, &mut bytes).is_ok());
    }
}

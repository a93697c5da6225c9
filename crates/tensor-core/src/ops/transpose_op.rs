// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis permutation.

use super::{expect_output_shape, fixed_strides, invalid, MAX_RANK};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "transpose";

/// Infers `out[i] = in[perm[i]]`, checking that `perm` is a permutation.
pub fn transpose_output_shape(input: &Shape, perm: &[usize]) -> Result<Shape, TensorError> {
    let rank = input.rank();
    if perm.len() != rank || rank > MAX_RANK {
        return Err(invalid(OP, format!("perm {perm:?} does not fit rank-{rank} input")));
    }
    let mut seen = [false; MAX_RANK];
    for &axis in perm {
        if axis >= rank || seen[axis] {
            return Err(invalid(OP, format!("perm {perm:?} is not a permutation")));
        }
        seen[axis] = true;
    }
    Ok(Shape::new(perm.iter().map(|&a| input.dims()[a]).collect()))
}

/// Writes `input` with its axes reordered by `perm` into `output`.
pub fn transpose(
    input: &TensorView<'_>,
    perm: &[usize],
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let expected = transpose_output_shape(input.shape(), perm)?;
    expect_output_shape(OP, expected.clone(), output.shape())?;

    let in_strides = fixed_strides(input.shape().dims());
    let out_strides = fixed_strides(expected.dims());
    let rank = perm.len();

    let x = input.f32_data(OP)?;
    let y = output.f32_data_mut(OP)?;

    for (flat, out) in y.iter_mut().enumerate() {
        let mut rem = flat;
        let mut src = 0;
        for i in 0..rank {
            let idx = rem / out_strides[i];
            rem %= out_strides[i];
            src += idx * in_strides[perm[i]];
        }
        *out = x[src];
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Tensor};

    #[test]
    fn test_transpose_matrix() {
        let input =
            Tensor::from_f32(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut out = Tensor::zeros(Shape::matrix(3, 2), DType::F32);
        transpose(&input.view(), &[1, 0], &mut out.view_mut()).unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_nhwc_to_nchw_shape() {
        let shape = transpose_output_shape(&Shape::nhwc(1, 40, 3, 8), &[0, 3, 1, 2]).unwrap();
        assert_eq!(shape.dims(), &[1, 8, 40, 3]);
    }

    #[test]
    fn test_transpose_identity_perm() {
        let input = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
        let mut out = Tensor::zeros(Shape::vector(3), DType::F32);
        transpose(&input.view(), &[0], &mut out.view_mut()).unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_transpose_rejects_bad_perm() {
        assert!(transpose_output_shape(&Shape::matrix(2, 2), &[0, 0]).is_err());
        assert!(transpose_output_shape(&Shape::matrix(2, 2), &[0, 2]).is_err());
        assert!(transpose_output_shape(&Shape::matrix(2, 2), &[0]).is_err());
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constant zero padding.

use super::{expect_output_shape, fixed_strides, invalid, MAX_RANK};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "pad";

/// Infers the padded shape: `out[d] = in[d] + before[d] + after[d]`.
pub fn pad_output_shape(input: &Shape, paddings: &[[usize; 2]]) -> Result<Shape, TensorError> {
    if paddings.len() != input.rank() {
        return Err(invalid(
            OP,
            format!("{} padding pairs for rank-{} input", paddings.len(), input.rank()),
        ));
    }
    if input.rank() > MAX_RANK {
        return Err(invalid(OP, format!("rank {} exceeds {MAX_RANK}", input.rank())));
    }
    let dims = input
        .dims()
        .iter()
        .zip(paddings)
        .map(|(d, [before, after])| {
            d.checked_add(*before)
                .and_then(|d| d.checked_add(*after))
                .ok_or_else(|| invalid(OP, format!("padding {before}+{after} overflows dimension {d}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Shape::new(dims))
}

/// Copies `input` into the interior of a zero-filled `output`.
pub fn pad(
    input: &TensorView<'_>,
    paddings: &[[usize; 2]],
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let expected = pad_output_shape(input.shape(), paddings)?;
    expect_output_shape(OP, expected.clone(), output.shape())?;

    let in_dims = input.shape().dims();
    let rank = in_dims.len();
    let in_strides = fixed_strides(in_dims);
    let out_strides = fixed_strides(expected.dims());

    let x = input.f32_data(OP)?;
    let y = output.f32_data_mut(OP)?;
    y.fill(0.0);

    for (flat, &v) in x.iter().enumerate() {
        let mut rem = flat;
        let mut dst = 0;
        for d in 0..rank {
            let idx = rem / in_strides[d];
            rem %= in_strides[d];
            dst += (idx + paddings[d][0]) * out_strides[d];
        }
        y[dst] = v;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Tensor};

    #[test]
    fn test_pad_matrix() {
        let input = Tensor::from_f32(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let paddings = [[1, 0], [0, 1]];
        let shape = pad_output_shape(input.shape(), &paddings).unwrap();
        assert_eq!(shape, Shape::matrix(3, 3));

        let mut out = Tensor::zeros(shape, DType::F32);
        pad(&input.view(), &paddings, &mut out.view_mut()).unwrap();
        assert_eq!(
            out.as_f32_slice(),
            &[0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0]
        );
    }

    #[test]
    fn test_pad_overwrites_stale_output() {
        let input = Tensor::from_f32(Shape::vector(1), &[7.0]).unwrap();
        let mut out = Tensor::from_f32(Shape::vector(3), &[9.0, 9.0, 9.0]).unwrap();
        pad(&input.view(), &[[1, 1]], &mut out.view_mut()).unwrap();
        assert_eq!(out.as_f32_slice(), &[0.0, 7.0, 0.0]);
    }

    #[test]
    fn test_pad_rank_mismatch() {
        assert!(pad_output_shape(&Shape::matrix(2, 2), &[[1, 1]]).is_err());
    }

    #[test]
    fn test_pad_rejects_overflowing_amounts() {
        let err = pad_output_shape(&Shape::vector(3), &[[usize::MAX, 1]]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidParams { op: "pad", .. }));
    }
}

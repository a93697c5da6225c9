// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine int8 to f32 dequantization.

use crate::{TensorError, TensorView, TensorViewMut};

const OP: &str = "dequantize";

/// Computes `output[i] = (input[i] - zero_point) * scale`.
///
/// `input` must be `I8` and `output` `F32`, with equal shapes.
pub fn dequantize(
    input: &TensorView<'_>,
    scale: f32,
    zero_point: i32,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    let q = input.i8_data(OP)?;
    let y = output.f32_data_mut(OP)?;
    for (out, &v) in y.iter_mut().zip(q) {
        *out = (i32::from(v) - zero_point) as f32 * scale;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Shape, Tensor};

    #[test]
    fn test_dequantize_affine() {
        let input = Tensor::from_i8(Shape::vector(4), &[-128, -1, 0, 127]).unwrap();
        let mut out = Tensor::zeros(Shape::vector(4), DType::F32);
        dequantize(&input.view(), 0.5, -1, &mut out.view_mut()).unwrap();
        assert_eq!(out.as_f32_slice(), &[-63.5, 0.0, 0.5, 64.0]);
    }

    #[test]
    fn test_dequantize_requires_i8() {
        let input = Tensor::from_f32(Shape::vector(1), &[1.0]).unwrap();
        let mut out = Tensor::zeros(Shape::vector(1), DType::F32);
        assert!(matches!(
            dequantize(&input.view(), 1.0, 0, &mut out.view_mut()),
            Err(TensorError::UnsupportedDType { .. })
        ));
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax activation operation.

use crate::{TensorError, TensorView, TensorViewMut};

const OP: &str = "softmax";

/// Computes softmax along the last dimension:
/// `output[i] = exp(beta * (x[i] - max)) / sum(exp(beta * (x - max)))`.
///
/// Uses the numerically stable variant that subtracts the maximum value
/// before exponentiation to prevent overflow.
///
/// Both `input` and `output` must have the same shape and be `F32`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
/// Returns [`TensorError::UnsupportedDType`] if the dtype is not `F32`.
/// Returns [`TensorError::Numeric`] if a row contains NaN or infinity, since
/// no probability distribution can be produced from it.
pub fn softmax(
    input: &TensorView<'_>,
    beta: f32,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let last_dim = input.shape().dims().last().copied().unwrap_or(1);
    let src = input.f32_data(OP)?;
    let dst = output.f32_data_mut(OP)?;
    if last_dim == 0 || src.is_empty() {
        return Ok(());
    }

    for (row, (row_src, row_dst)) in src
        .chunks_exact(last_dim)
        .zip(dst.chunks_exact_mut(last_dim))
        .enumerate()
    {
        if let Some(bad) = row_src.iter().find(|v| !v.is_finite()) {
            return Err(TensorError::Numeric {
                op: OP,
                detail: format!("row {row} contains non-finite value {bad}"),
            });
        }

        let max_val = row_src.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for (d, &s) in row_dst.iter_mut().zip(row_src) {
            let e = (beta * (s - max_val)).exp();
            *d = e;
            sum += e;
        }

        if sum > 0.0 {
            let inv_sum = 1.0 / sum;
            for d in row_dst.iter_mut() {
                *d *= inv_sum;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Shape, Tensor};

    fn approx_eq(a: &[f32], b: &[f32], tol: f32) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    fn run(shape: Shape, values: &[f32], beta: f32) -> Result<Tensor, TensorError> {
        let input = Tensor::from_f32(shape.clone(), values).unwrap();
        let mut output = Tensor::zeros(shape, DType::F32);
        softmax(&input.view(), beta, &mut output.view_mut())?;
        Ok(output)
    }

    #[test]
    fn test_softmax_uniform() {
        let out = run(Shape::vector(4), &[1.0, 1.0, 1.0, 1.0], 1.0).unwrap();
        assert!(approx_eq(out.as_f32_slice(), &[0.25, 0.25, 0.25, 0.25], 1e-5));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let out = run(Shape::vector(5), &[1.0, 2.0, 3.0, 4.0, 5.0], 1.0).unwrap();
        let sum: f32 = out.as_f32_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_softmax_monotonic() {
        let out = run(Shape::vector(3), &[1.0, 2.0, 3.0], 1.0).unwrap();
        let r = out.as_f32_slice();
        assert!(r[0] < r[1]);
        assert!(r[1] < r[2]);
    }

    #[test]
    fn test_softmax_rows() {
        // Softmax applied row-wise on a [2, 3] tensor.
        let out = run(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0], 1.0).unwrap();
        let r = out.as_f32_slice();
        let sum0: f32 = r[0..3].iter().sum();
        assert!((sum0 - 1.0).abs() < 1e-5);
        assert!(approx_eq(&r[3..6], &[1.0 / 3.0; 3], 1e-5));
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let out = run(Shape::vector(3), &[1000.0, 1001.0, 1002.0], 1.0).unwrap();
        let r = out.as_f32_slice();
        let sum: f32 = r.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(r.iter().all(|&x| x.is_finite()));
    }

    #[test]
    fn test_softmax_beta_zero_is_uniform() {
        let out = run(Shape::vector(2), &[-4.0, 9.0], 0.0).unwrap();
        assert!(approx_eq(out.as_f32_slice(), &[0.5, 0.5], 1e-6));
    }

    #[test]
    fn test_softmax_rejects_nan() {
        let err = run(Shape::vector(3), &[0.0, f32::NAN, 1.0], 1.0).unwrap_err();
        assert!(matches!(err, TensorError::Numeric { .. }));
    }

    #[test]
    fn test_softmax_shape_mismatch() {
        let input = Tensor::from_f32(Shape::vector(3), &[0.0; 3]).unwrap();
        let mut output = Tensor::zeros(Shape::vector(4), DType::F32);
        assert!(matches!(
            softmax(&input.view(), 1.0, &mut output.view_mut()),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}

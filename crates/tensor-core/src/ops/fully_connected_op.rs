// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected (dense) layer.

use super::{expect_output_shape, invalid, Activation};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "fully_connected";

/// Infers the output shape of a fully-connected layer.
///
/// `weights` is `[units, in_features]`. The input is flattened to
/// `[batch, in_features]`, where `batch = input.num_elements() / in_features`
/// must divide evenly. The output is `[batch, units]`.
pub fn fully_connected_output_shape(input: &Shape, weights: &Shape) -> Result<Shape, TensorError> {
    if weights.rank() != 2 {
        return Err(invalid(OP, format!("weights must be rank-2, got {weights}")));
    }
    let (units, in_features) = (weights.dims()[0], weights.dims()[1]);
    let total = input.num_elements();
    if in_features == 0 || total == 0 || total % in_features != 0 {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.clone(),
            rhs: weights.clone(),
        });
    }
    Ok(Shape::matrix(total / in_features, units))
}

/// Computes `output = activation(input @ weights^T + bias)`.
///
/// Each output unit is a dot product over a contiguous weight row, which
/// keeps both operands sequential in memory.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the geometry does not line up,
/// and [`TensorError::UnsupportedDType`] for non-`F32` operands.
pub fn fully_connected(
    input: &TensorView<'_>,
    weights: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    activation: Activation,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let expected = fully_connected_output_shape(input.shape(), weights.shape())?;
    expect_output_shape(OP, expected.clone(), output.shape())?;

    let (batch, units) = (expected.dims()[0], expected.dims()[1]);
    let k = weights.shape().dims()[1];

    let x = input.f32_data(OP)?;
    let w = weights.f32_data(OP)?;
    let b = match bias {
        Some(view) => {
            let data = view.f32_data(OP)?;
            if data.len() != units {
                return Err(TensorError::ShapeMismatch {
                    op: "fully_connected (bias)",
                    lhs: Shape::vector(units),
                    rhs: view.shape().clone(),
                });
            }
            Some(data)
        }
        None => None,
    };
    let y = output.f32_data_mut(OP)?;

    for i in 0..batch {
        let row = &x[i * k..(i + 1) * k];
        let out_row = &mut y[i * units..(i + 1) * units];
        for (u, out) in out_row.iter_mut().enumerate() {
            let w_row = &w[u * k..(u + 1) * k];
            let dot: f32 = row.iter().zip(w_row).map(|(a, b)| a * b).sum();
            *out = activation.apply(dot + b.map_or(0.0, |b| b[u]));
        }
    }

    Ok(())
}

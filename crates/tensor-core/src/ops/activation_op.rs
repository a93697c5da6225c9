// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rectified-linear activation, standalone and fused.

use super::invalid;
use crate::{TensorError, TensorView, TensorViewMut};

/// Activation fused into the epilogue of conv / fully-connected kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Identity.
    #[default]
    None,
    /// `max(x, 0)`.
    Relu,
}

impl Activation {
    /// Applies the activation to one value.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::None => x,
            Activation::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
        }
    }
}

/// Element-wise `output[i] = max(input[i], 0)`.
///
/// Input and output must hold the same number of `F32` elements.
pub fn relu(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    const OP: &str = "relu";
    let src = input.f32_data(OP)?;
    let dst = output.f32_data_mut(OP)?;
    if src.len() != dst.len() {
        return Err(invalid(
            OP,
            format!("input has {} elements, output {}", src.len(), dst.len()),
        ));
    }
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = Activation::Relu.apply(s);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Shape, Tensor};

    #[test]
    fn test_relu_clamps_negatives() {
        let input = Tensor::from_f32(Shape::vector(4), &[-2.0, -0.0, 0.5, 3.0]).unwrap();
        let mut output = Tensor::zeros(Shape::vector(4), DType::F32);
        relu(&input.view(), &mut output.view_mut()).unwrap();
        assert_eq!(output.as_f32_slice(), &[0.0, 0.0, 0.5, 3.0]);
    }

    #[test]
    fn test_relu_length_mismatch() {
        let input = Tensor::from_f32(Shape::vector(2), &[1.0, 2.0]).unwrap();
        let mut output = Tensor::zeros(Shape::vector(3), DType::F32);
        assert!(relu(&input.view(), &mut output.view_mut()).is_err());
    }

    #[test]
    fn test_fused_none_is_identity() {
        assert_eq!(Activation::None.apply(-1.5), -1.5);
        assert_eq!(Activation::Relu.apply(-1.5), 0.0);
    }
}

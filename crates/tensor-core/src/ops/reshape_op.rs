// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape: same bytes, new dimensions.

use super::invalid;
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "reshape";

/// Resolves a target shape against `input`.
///
/// At most one entry may be `-1`; it absorbs whatever element count is
/// left over. Every other entry must be non-negative, and the resolved
/// shape must hold exactly as many elements as `input`.
pub fn reshape_output_shape(input: &Shape, target: &[i64]) -> Result<Shape, TensorError> {
    let total = input
        .checked_num_elements()
        .ok_or_else(|| invalid(OP, format!("input {input} overflows the element count")))?;
    let mut wildcard = None;
    let mut known = 1usize;
    let mut dims = Vec::with_capacity(target.len());
    for (i, &d) in target.iter().enumerate() {
        match d {
            -1 if wildcard.is_none() => {
                wildcard = Some(i);
                dims.push(0);
            }
            -1 => return Err(invalid(OP, format!("more than one -1 in {target:?}"))),
            d if d < 0 => return Err(invalid(OP, format!("negative dimension in {target:?}"))),
            d => {
                let d = usize::try_from(d)
                    .map_err(|_| invalid(OP, format!("dimension {d} does not fit usize")))?;
                known = known
                    .checked_mul(d)
                    .ok_or_else(|| invalid(OP, format!("{target:?} overflows the element count")))?;
                dims.push(d);
            }
        }
    }

    if let Some(i) = wildcard {
        if known == 0 || total % known != 0 {
            return Err(invalid(
                OP,
                format!("cannot infer -1 in {target:?} for {total} elements"),
            ));
        }
        dims[i] = total / known;
    }

    let shape = Shape::new(dims);
    if shape.checked_num_elements() != Some(total) {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.clone(),
            rhs: shape,
        });
    }
    Ok(shape)
}

/// Copies the input bytes into an output of the same size.
///
/// Arena tensors never alias, so reshape is a copy rather than a relabel.
pub fn reshape(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    if input.dtype() != output.dtype() || input.bytes() != output.bytes() {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    output.as_bytes_mut().copy_from_slice(input.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Tensor};

    #[test]
    fn test_reshape_infers_wildcard() {
        let shape = reshape_output_shape(&Shape::nhwc(1, 20, 1, 16), &[1, -1]).unwrap();
        assert_eq!(shape, Shape::matrix(1, 320));
    }

    #[test]
    fn test_reshape_rejects_bad_targets() {
        let input = Shape::vector(6);
        assert!(reshape_output_shape(&input, &[-1, -1]).is_err());
        assert!(reshape_output_shape(&input, &[4, -1]).is_err());
        assert!(reshape_output_shape(&input, &[2, 2]).is_err());
        assert!(reshape_output_shape(&input, &[-2, 3]).is_err());
    }

    #[test]
    fn test_reshape_rejects_overflowing_target() {
        let input = Shape::vector(6);
        let err = reshape_output_shape(&input, &[1 << 40, 1 << 40, -1]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidParams { op: "reshape", .. }));
        assert!(reshape_output_shape(&input, &[i64::MAX, i64::MAX]).is_err());
    }

    #[test]
    fn test_reshape_copies_bytes() {
        let input = Tensor::from_f32(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut out = Tensor::zeros(Shape::vector(4), DType::F32);
        reshape(&input.view(), &mut out.view_mut()).unwrap();
        assert_eq!(out.as_f32_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }
}

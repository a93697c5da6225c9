// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D convolution over NHWC activations.

use super::{expect_output_shape, invalid, Activation, Padding};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "conv_2d";

/// Geometry and epilogue of a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dParams {
    /// Vertical and horizontal stride.
    pub stride: [usize; 2],
    /// Padding scheme.
    pub padding: Padding,
    /// Fused activation.
    pub activation: Activation,
}

impl Default for Conv2dParams {
    fn default() -> Self {
        Self {
            stride: [1, 1],
            padding: Padding::Same,
            activation: Activation::None,
        }
    }
}

/// Infers the output shape of a convolution.
///
/// `input` is `[N, H, W, C_in]`, `filter` is `[C_out, KH, KW, C_in]`;
/// the output is `[N, OH, OW, C_out]`.
pub fn conv2d_output_shape(
    input: &Shape,
    filter: &Shape,
    params: &Conv2dParams,
) -> Result<Shape, TensorError> {
    let (n, ih, iw, ic) = input
        .as_nhwc()
        .ok_or_else(|| invalid(OP, format!("input must be rank-4 NHWC, got {input}")))?;
    let (oc, kh, kw, fc) = filter
        .as_nhwc()
        .ok_or_else(|| invalid(OP, format!("filter must be rank-4, got {filter}")))?;
    if fc != ic {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.clone(),
            rhs: filter.clone(),
        });
    }
    let (oh, _) = params
        .padding
        .resolve(ih, kh, params.stride[0])
        .ok_or_else(|| invalid(OP, format!("cannot fit {kh}-tall window over {ih} rows")))?;
    let (ow, _) = params
        .padding
        .resolve(iw, kw, params.stride[1])
        .ok_or_else(|| invalid(OP, format!("cannot fit {kw}-wide window over {iw} columns")))?;
    Ok(Shape::nhwc(n, oh, ow, oc))
}

/// Computes a 2-D convolution with optional bias and fused activation.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the output view does not have
/// the inferred shape, or the bias length differs from `C_out`.
pub fn conv2d(
    input: &TensorView<'_>,
    filter: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    params: &Conv2dParams,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let expected = conv2d_output_shape(input.shape(), filter.shape(), params)?;
    expect_output_shape(OP, expected.clone(), output.shape())?;

    let dims = input.shape().dims();
    let (batch, ih, iw, ic) = (dims[0], dims[1], dims[2], dims[3]);
    let fdims = filter.shape().dims();
    let (oc, kh, kw) = (fdims[0], fdims[1], fdims[2]);
    let odims = expected.dims();
    let (oh, ow) = (odims[1], odims[2]);
    let (sh, sw) = (params.stride[0], params.stride[1]);
    let pad_h = params.padding.resolve(ih, kh, sh).map_or(0, |(_, p)| p);
    let pad_w = params.padding.resolve(iw, kw, sw).map_or(0, |(_, p)| p);

    let x = input.f32_data(OP)?;
    let w = filter.f32_data(OP)?;
    let b = match bias {
        Some(view) => {
            let data = view.f32_data(OP)?;
            if data.len() != oc {
                return Err(TensorError::ShapeMismatch {
                    op: "conv_2d (bias)",
                    lhs: Shape::vector(oc),
                    rhs: view.shape().clone(),
                });
            }
            Some(data)
        }
        None => None,
    };
    let y = output.f32_data_mut(OP)?;

    for n in 0..batch {
        for oy in 0..oh {
            for ox in 0..ow {
                let out_base = ((n * oh + oy) * ow + ox) * oc;
                for o in 0..oc {
                    let mut acc = b.map_or(0.0, |b| b[o]);
                    for ky in 0..kh {
                        let iy = (oy * sh + ky) as isize - pad_h as isize;
                        if iy < 0 || iy >= ih as isize {
                            continue;
                        }
                        for kx in 0..kw {
                            let ix = (ox * sw + kx) as isize - pad_w as isize;
                            if ix < 0 || ix >= iw as isize {
                                continue;
                            }
                            let in_base = ((n * ih + iy as usize) * iw + ix as usize) * ic;
                            let w_base = ((o * kh + ky) * kw + kx) * ic;
                            let patch = &x[in_base..in_base + ic];
                            let taps = &w[w_base..w_base + ic];
                            acc += patch.iter().zip(taps).map(|(a, b)| a * b).sum::<f32>();
                        }
                    }
                    y[out_base + o] = params.activation.apply(acc);
                }
            }
        }
    }

    Ok(())
}

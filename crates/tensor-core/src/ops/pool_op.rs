// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D max pooling over NHWC activations.

use super::{expect_output_shape, invalid, Padding};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "max_pool_2d";

/// Window geometry for pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool2dParams {
    /// Window height and width.
    pub filter: [usize; 2],
    /// Vertical and horizontal stride.
    pub stride: [usize; 2],
    /// Padding scheme. Padded cells never win the max.
    pub padding: Padding,
}

/// Infers the pooled shape; channels are preserved.
pub fn max_pool2d_output_shape(input: &Shape, params: &Pool2dParams) -> Result<Shape, TensorError> {
    let (n, ih, iw, c) = input
        .as_nhwc()
        .ok_or_else(|| invalid(OP, format!("input must be rank-4 NHWC, got {input}")))?;
    let [fh, fw] = params.filter;
    let (oh, _) = params
        .padding
        .resolve(ih, fh, params.stride[0])
        .ok_or_else(|| invalid(OP, format!("cannot fit {fh}x{fw} window over {ih}x{iw}")))?;
    let (ow, _) = params
        .padding
        .resolve(iw, fw, params.stride[1])
        .ok_or_else(|| invalid(OP, format!("cannot fit {fh}x{fw} window over {ih}x{iw}")))?;
    Ok(Shape::nhwc(n, oh, ow, c))
}

/// Writes the maximum of each window into `output`.
pub fn max_pool2d(
    input: &TensorView<'_>,
    params: &Pool2dParams,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let expected = max_pool2d_output_shape(input.shape(), params)?;
    expect_output_shape(OP, expected.clone(), output.shape())?;

    let dims = input.shape().dims();
    let (batch, ih, iw, c) = (dims[0], dims[1], dims[2], dims[3]);
    let (oh, ow) = (expected.dims()[1], expected.dims()[2]);
    let [fh, fw] = params.filter;
    let [sh, sw] = params.stride;
    let pad_h = params.padding.resolve(ih, fh, sh).map_or(0, |(_, p)| p);
    let pad_w = params.padding.resolve(iw, fw, sw).map_or(0, |(_, p)| p);

    let x = input.f32_data(OP)?;
    let y = output.f32_data_mut(OP)?;

    for n in 0..batch {
        for oy in 0..oh {
            // Clip the window to the valid input rows.
            let y0 = (oy * sh).saturating_sub(pad_h);
            let y1 = (oy * sh + fh).saturating_sub(pad_h).min(ih);
            for ox in 0..ow {
                let x0 = (ox * sw).saturating_sub(pad_w);
                let x1 = (ox * sw + fw).saturating_sub(pad_w).min(iw);
                let out_base = ((n * oh + oy) * ow + ox) * c;
                for ch in 0..c {
                    let mut best = f32::NEG_INFINITY;
                    for iy in y0..y1 {
                        for ix in x0..x1 {
                            let v = x[((n * ih + iy) * iw + ix) * c + ch];
                            if v > best {
                                best = v;
                            }
                        }
                    }
                    y[out_base + ch] = best;
                }
            }
        }
    }

    Ok(())
}

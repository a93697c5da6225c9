// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor kernels.
//!
//! Each kernel reads borrowed input views and writes into a pre-allocated
//! output view, so running a graph never allocates. Every kernel has a
//! matching `*_output_shape` function; the model validator uses those to
//! infer shapes, and the kernel re-checks its output view against the
//! same rule before touching memory.
//!
//! Layout is NHWC throughout (batch, height, width, channels).

mod activation_op;
mod conv_op;
mod dequantize_op;
mod fully_connected_op;
mod pad_op;
mod pool_op;
mod reshape_op;
mod softmax_op;
mod transpose_op;

pub use activation_op::{relu, Activation};
pub use conv_op::{conv2d, conv2d_output_shape, Conv2dParams};
pub use dequantize_op::dequantize;
pub use fully_connected_op::{fully_connected, fully_connected_output_shape};
pub use pad_op::{pad, pad_output_shape};
pub use pool_op::{max_pool2d, max_pool2d_output_shape, Pool2dParams};
pub use reshape_op::{reshape, reshape_output_shape};
pub use softmax_op::softmax;
pub use transpose_op::{transpose, transpose_output_shape};

use crate::{Shape, TensorError};

/// Highest rank the index-remapping kernels (pad, transpose) handle.
pub const MAX_RANK: usize = 6;

/// Spatial padding scheme for convolution and pooling windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Output size is `ceil(input / stride)`; the window is zero-padded
    /// evenly, with any odd cell going after.
    #[default]
    Same,
    /// No padding; windows must fit entirely inside the input.
    Valid,
}

impl Padding {
    /// Resolves one spatial dimension to `(output_size, pad_before)`.
    ///
    /// Returns `None` when the geometry is impossible (zero stride or
    /// filter, empty input, or a `Valid` window larger than the input).
    pub fn resolve(self, input: usize, filter: usize, stride: usize) -> Option<(usize, usize)> {
        if input == 0 || filter == 0 || stride == 0 {
            return None;
        }
        match self {
            Padding::Same => {
                let out = input.div_ceil(stride);
                let needed = ((out - 1) * stride).checked_add(filter)?.saturating_sub(input);
                Some((out, needed / 2))
            }
            Padding::Valid => {
                if input < filter {
                    return None;
                }
                Some(((input - filter) / stride + 1, 0))
            }
        }
    }
}

pub(crate) fn invalid(op: &'static str, detail: impl Into<String>) -> TensorError {
    TensorError::InvalidParams {
        op,
        detail: detail.into(),
    }
}

/// Checks that the caller handed in an output view of the inferred shape.
pub(crate) fn expect_output_shape(
    op: &'static str,
    expected: Shape,
    actual: &Shape,
) -> Result<(), TensorError> {
    if &expected != actual {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: expected,
            rhs: actual.clone(),
        });
    }
    Ok(())
}

/// Row-major strides into a fixed array; dimensions beyond `rank` are zero.
pub(crate) fn fixed_strides(dims: &[usize]) -> [usize; MAX_RANK] {
    let mut strides = [0usize; MAX_RANK];
    let mut acc = 1;
    for i in (0..dims.len()).rev() {
        strides[i] = acc;
        acc *= dims[i];
    }
    strides
}

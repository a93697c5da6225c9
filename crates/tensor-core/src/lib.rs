// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor descriptors, borrowed views and f32 kernels for the edge-bench
//! micro-interpreter.
//!
//! This crate provides:
//! - [`AlignedBuf`]: an owned byte buffer whose base address is 8-byte
//!   aligned, so typed `f32` views over it never fail the alignment check.
//! - [`Tensor`]: an owned, shaped tensor backed by an [`AlignedBuf`].
//! - [`TensorView`] / [`TensorViewMut`]: typed, sized windows into someone
//!   else's memory (the scratch arena or the model blob).
//! - [`Shape`] and [`DType`]: NHWC shape descriptors and element types.
//! - Kernels: 2-D convolution, 2-D max pooling, ReLU, fully connected,
//!   softmax, pad, transpose, reshape and int8 dequantization.
//!
//! # Design Goals
//! - Kernels write into pre-allocated output views; nothing allocates in
//!   the inference hot path.
//! - Shape rules live next to each kernel (`*_output_shape`) so the model
//!   validator and the kernel agree on geometry.
//! - Clean error types via `thiserror`.

mod buffer;
mod dtype;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use buffer::AlignedBuf;
pub use dtype::DType;
pub use error::TensorError;
pub use ops::{
    conv2d, conv2d_output_shape, dequantize, fully_connected, fully_connected_output_shape,
    max_pool2d, max_pool2d_output_shape, pad, pad_output_shape, relu, reshape,
    reshape_output_shape, softmax, transpose, transpose_output_shape, Activation, Conv2dParams,
    Padding, Pool2dParams,
};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView, TensorViewMut};

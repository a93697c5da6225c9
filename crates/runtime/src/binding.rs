// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Copying a test sample into the session's input tensor.

use crate::RuntimeError;
use tensor_core::TensorViewMut;

/// Copies `data` into `view` after checking the byte lengths match.
///
/// On mismatch nothing is written.
pub fn bind_input(view: &mut TensorViewMut<'_>, data: &[u8]) -> Result<(), RuntimeError> {
    if view.bytes() != data.len() {
        return Err(RuntimeError::SizeMismatch {
            expected: view.bytes(),
            actual: data.len(),
        });
    }
    view.as_bytes_mut().copy_from_slice(data);
    Ok(())
}

/// Convenience wrapper for `f32` samples.
pub fn bind_input_f32(view: &mut TensorViewMut<'_>, data: &[f32]) -> Result<(), RuntimeError> {
    bind_input(view, bytemuck::cast_slice(data))
}

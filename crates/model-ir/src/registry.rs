// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-capacity operator registry.
//!
//! The registry is the set of kernels a session is allowed to run. Its
//! capacity is a compile-time constant and the table lives inline, so
//! building one never allocates. Overfilling it is a construction-time
//! contract violation reported as [`RegistryError`], never an inference
//! failure.

use crate::{OpKind, RegistryError};

/// Slots in the default registry.
pub const OP_CAPACITY: usize = 12;

/// Operators registered by [`register_supported_ops`], in registration order.
pub const SUPPORTED_OPS: [OpKind; 9] = [
    OpKind::Conv2d,
    OpKind::MaxPool2d,
    OpKind::Relu,
    OpKind::FullyConnected,
    OpKind::Reshape,
    OpKind::Softmax,
    OpKind::Pad,
    OpKind::Transpose,
    OpKind::Dequantize,
];

const _: () = assert!(SUPPORTED_OPS.len() <= OP_CAPACITY);

/// A bounded set of supported operators.
#[derive(Debug, Clone)]
pub struct OperatorRegistry<const N: usize = OP_CAPACITY> {
    slots: [Option<OpKind>; N],
    len: usize,
}

impl<const N: usize> OperatorRegistry<N> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            len: 0,
        }
    }

    /// Registers an operator.
    ///
    /// # Errors
    /// [`RegistryError::Duplicate`] if `op` is already present,
    /// [`RegistryError::CapacityExceeded`] if all `N` slots are taken.
    pub fn add(&mut self, op: OpKind) -> Result<(), RegistryError> {
        if self.contains(op) {
            return Err(RegistryError::Duplicate(op));
        }
        if self.len == N {
            return Err(RegistryError::CapacityExceeded { capacity: N, op });
        }
        self.slots[self.len] = Some(op);
        self.len += 1;
        Ok(())
    }

    /// Returns `true` if `op` has been registered.
    pub fn contains(&self, op: OpKind) -> bool {
        self.iter().any(|o| o == op)
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterates registered operators in registration order.
    pub fn iter(&self) -> impl Iterator<Item = OpKind> + '_ {
        self.slots[..self.len].iter().flatten().copied()
    }
}

impl<const N: usize> Default for OperatorRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the default registry holding every kernel the interpreter ships.
pub fn register_supported_ops() -> Result<OperatorRegistry, RegistryError> {
    let mut registry = OperatorRegistry::new();
    for op in SUPPORTED_OPS {
        registry.add(op)?;
    }
    tracing::debug!(
        "registered {} of {} operator slots",
        registry.len(),
        registry.capacity()
    );
    Ok(registry)
}

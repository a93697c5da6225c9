// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and IR construction.

use crate::OpKind;

/// Errors that can occur when working with model representations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The blob's schema version differs from the one this engine reads.
    #[error("model schema version mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: u32, found: String },

    /// The blob is not a readable model container.
    #[error("invalid model blob: {0}")]
    InvalidBlob(String),

    /// The model file could not be read or mapped.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded graph manifest is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// A weight tensor referenced by a node is not in the blob.
    #[error("weight tensor not found: {name}")]
    WeightNotFound { name: String },

    /// A weight tensor is stored with an element type the kernels cannot read.
    #[error("weight tensor '{name}' has unsupported dtype {dtype}")]
    WeightDType { name: String, dtype: String },

    /// A weight tensor's bytes are not 4-byte aligned inside the blob.
    #[error("weight tensor '{name}' is not aligned for f32 access")]
    Misaligned { name: String },

    /// A node definition is invalid (e.g., incompatible shapes).
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// The model graph is otherwise malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}

/// Contract violations while populating an [`crate::OperatorRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Every slot in the fixed-capacity table is taken.
    #[error("operator registry is full ({capacity} slots), cannot add {op}")]
    CapacityExceeded { capacity: usize, op: OpKind },

    /// The operator is already registered.
    #[error("operator {0} is already registered")]
    Duplicate(OpKind),
}

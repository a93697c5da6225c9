// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Writing model blobs.

use crate::descriptor::{GRAPH_KEY, SCHEMA_KEY, SCHEMA_VERSION};
use crate::{ModelError, ModelManifest, NodeDef, Operator, TensorSpec};
use std::collections::HashMap;
use std::path::Path;
use tensor_core::{AlignedBuf, Shape};

/// An owned, 8-byte aligned model blob.
///
/// Weight slices borrowed from the blob are cast to `f32` in place, so the
/// backing buffer must be aligned; a plain `Vec<u8>` is not guaranteed to be.
#[derive(Debug, Clone)]
pub struct ModelBlob {
    buf: AlignedBuf,
}

impl ModelBlob {
    /// Copies `bytes` into an aligned blob.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: AlignedBuf::from_bytes(bytes),
        }
    }

    /// Reads a blob file fully into aligned memory.
    pub fn read(path: &Path) -> Result<Self, ModelError> {
        Ok(Self::from_bytes(&std::fs::read(path)?))
    }

    /// Writes the blob to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::write(path, self.as_bytes())?;
        Ok(())
    }

    /// The serialized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Blob size in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` for an empty blob.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Builds a model blob from nodes and f32 weights.
///
/// # Example
/// ```
/// use model_ir::{ModelBuilder, ModelDescriptor, Operator, TensorSpec};
/// use tensor_core::{DType, Shape};
///
/// let blob = ModelBuilder::new(
///     "probs-only",
///     TensorSpec { name: "x".into(), shape: Shape::matrix(1, 5), dtype: DType::F32 },
/// )
/// .node("probs", Operator::Softmax { beta: 1.0 })
/// .build()
/// .unwrap();
///
/// let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
/// assert_eq!(model.graph().unwrap().num_nodes(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    manifest: ModelManifest,
    weights: Vec<(String, Shape, Vec<f32>)>,
    schema_version: String,
}

impl ModelBuilder {
    /// Starts a model with the given name and input.
    pub fn new(name: impl Into<String>, input: TensorSpec) -> Self {
        Self {
            manifest: ModelManifest {
                name: name.into(),
                input,
                nodes: Vec::new(),
            },
            weights: Vec::new(),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Appends a node to the chain.
    pub fn node(mut self, name: impl Into<String>, op: Operator) -> Self {
        self.manifest.nodes.push(NodeDef {
            name: name.into(),
            op,
        });
        self
    }

    /// Adds an f32 weight tensor.
    pub fn weight(mut self, name: impl Into<String>, shape: Shape, values: Vec<f32>) -> Self {
        self.weights.push((name.into(), shape, values));
        self
    }

    /// Overrides the schema version written into the header.
    pub fn schema_version(mut self, version: impl ToString) -> Self {
        self.schema_version = version.to_string();
        self
    }

    /// The manifest as built so far.
    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Serializes the model.
    ///
    /// The manifest is not validated here; [`crate::ModelDescriptor::graph`]
    /// does that when the blob is read back.
    pub fn build(self) -> Result<ModelBlob, ModelError> {
        for (name, shape, values) in &self.weights {
            if shape.checked_num_elements() != Some(values.len()) {
                return Err(ModelError::InvalidBlob(format!(
                    "weight '{name}' has {} values for shape {shape}",
                    values.len()
                )));
            }
        }

        let metadata = HashMap::from([
            (SCHEMA_KEY.to_string(), self.schema_version.clone()),
            (GRAPH_KEY.to_string(), self.manifest.to_json()?),
        ]);

        let views = self
            .weights
            .iter()
            .map(|(name, shape, values)| {
                safetensors::tensor::TensorView::new(
                    safetensors::Dtype::F32,
                    shape.dims().to_vec(),
                    bytemuck::cast_slice(values),
                )
                .map(|view| (name.as_str(), view))
                .map_err(|e| ModelError::InvalidBlob(format!("weight '{name}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bytes = safetensors::serialize(views.iter().map(|(n, v)| (*n, v)), &Some(metadata))
            .map_err(|e| ModelError::InvalidBlob(format!("serialization failed: {e}")))?;

        tracing::debug!(
            "built model '{}': {} nodes, {} weights, {} bytes",
            self.manifest.name,
            self.manifest.nodes.len(),
            self.weights.len(),
            bytes.len()
        );
        Ok(ModelBlob::from_bytes(&bytes))
    }
}

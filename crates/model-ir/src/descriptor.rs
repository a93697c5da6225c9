// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Read-only view over a serialized model blob.
//!
//! A blob is a SafeTensors container. Its `__metadata__` section carries
//! the schema version and the JSON graph manifest; its tensors are the
//! f32 weights. Nothing is copied out of the blob: the descriptor and the
//! weight slices it hands out borrow the caller's bytes, which may be a
//! memory-mapped file or a static buffer.

use crate::{graph, ModelError, ModelGraph, ModelManifest};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::fmt;
use tensor_core::{DType, Shape};

/// Schema version this engine reads.
pub const SCHEMA_VERSION: u32 = 3;

/// Metadata key holding the schema version (decimal string).
pub const SCHEMA_KEY: &str = "schema_version";

/// Metadata key holding the JSON graph manifest.
pub const GRAPH_KEY: &str = "graph";

/// Metadata for a single weight tensor, read from the SafeTensors header.
#[derive(Debug, Clone)]
pub struct WeightMeta {
    /// Tensor name (key in the SafeTensors header).
    pub name: String,
    /// Shape of the tensor.
    pub shape: Shape,
    /// Data type.
    pub dtype: DType,
    /// Size in bytes.
    pub size_bytes: usize,
}

/// An immutable, validated view of a model blob.
///
/// Construction checks the schema version before anything else is parsed;
/// a blob from a different schema is rejected without touching its graph.
pub struct ModelDescriptor<'a> {
    blob: &'a [u8],
    tensors: SafeTensors<'a>,
    schema_version: u32,
    manifest_json: String,
}

impl<'a> ModelDescriptor<'a> {
    /// Validates the blob's schema version and indexes its tensors.
    ///
    /// # Errors
    /// - [`ModelError::InvalidBlob`] if the header cannot be read or has no
    ///   metadata section.
    /// - [`ModelError::SchemaMismatch`] if the schema version is absent or
    ///   differs from [`SCHEMA_VERSION`].
    pub fn load(blob: &'a [u8]) -> Result<Self, ModelError> {
        let (_, metadata) = SafeTensors::read_metadata(blob)
            .map_err(|e| ModelError::InvalidBlob(format!("cannot read header: {e}")))?;
        let entries = metadata
            .metadata()
            .as_ref()
            .ok_or_else(|| ModelError::InvalidBlob("header has no __metadata__ section".into()))?;

        let found = entries
            .get(SCHEMA_KEY)
            .map(String::as_str)
            .unwrap_or("<absent>");
        let schema_version = match found.trim().parse::<u32>() {
            Ok(v) if v == SCHEMA_VERSION => v,
            _ => {
                return Err(ModelError::SchemaMismatch {
                    expected: SCHEMA_VERSION,
                    found: found.to_string(),
                })
            }
        };

        let manifest_json = entries
            .get(GRAPH_KEY)
            .cloned()
            .ok_or_else(|| ModelError::InvalidBlob("metadata has no graph manifest".into()))?;

        let tensors = SafeTensors::deserialize(blob)
            .map_err(|e| ModelError::InvalidBlob(format!("SafeTensors parse error: {e}")))?;

        tracing::debug!(
            "model blob: schema v{schema_version}, {} tensors, {} bytes",
            tensors.len(),
            blob.len()
        );

        Ok(Self {
            blob,
            tensors,
            schema_version,
            manifest_json,
        })
    }

    /// The blob's schema version (always [`SCHEMA_VERSION`] once loaded).
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Size of the underlying blob in bytes.
    pub fn blob_len(&self) -> usize {
        self.blob.len()
    }

    /// Parses the embedded graph manifest.
    pub fn manifest(&self) -> Result<ModelManifest, ModelError> {
        ModelManifest::from_json(&self.manifest_json)
    }

    /// Collects shape and dtype for every tensor in the blob.
    pub fn weight_metadata(&self) -> Result<HashMap<String, WeightMeta>, ModelError> {
        let mut meta = HashMap::new();
        for (name, view) in self.tensors.tensors() {
            let shape = Shape::new(view.shape().to_vec());
            let dtype = convert_safetensor_dtype(&name, view.dtype())?;
            let size_bytes = view.data().len();
            meta.insert(
                name.clone(),
                WeightMeta {
                    name,
                    shape,
                    dtype,
                    size_bytes,
                },
            );
        }
        Ok(meta)
    }

    /// Parses the manifest and validates it against the blob's weights.
    pub fn graph(&self) -> Result<ModelGraph<graph::Validated>, ModelError> {
        let manifest = self.manifest()?;
        manifest.validate()?;
        ModelGraph::new(manifest).validate(&self.weight_metadata()?)
    }

    /// Borrows a weight tensor as `f32`, straight out of the blob.
    ///
    /// # Errors
    /// [`ModelError::WeightNotFound`], [`ModelError::WeightDType`] for
    /// non-f32 tensors, or [`ModelError::Misaligned`] if the tensor's bytes
    /// do not start on a 4-byte boundary.
    pub fn weight_f32(&self, name: &str) -> Result<&'a [f32], ModelError> {
        let view = self
            .tensors
            .tensor(name)
            .map_err(|_| ModelError::WeightNotFound { name: name.into() })?;
        if view.dtype() != safetensors::Dtype::F32 {
            return Err(ModelError::WeightDType {
                name: name.into(),
                dtype: format!("{:?}", view.dtype()),
            });
        }
        bytemuck::try_cast_slice(view.data())
            .map_err(|_| ModelError::Misaligned { name: name.into() })
    }

    /// Returns a one-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "schema v{}, {} weight tensors, {:.1} KB blob",
            self.schema_version,
            self.tensors.len(),
            self.blob.len() as f64 / 1024.0
        )
    }
}

impl fmt::Debug for ModelDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("schema_version", &self.schema_version)
            .field("tensors", &self.tensors.len())
            .field("blob_len", &self.blob.len())
            .finish()
    }
}

/// Converts a SafeTensors `Dtype` to our [`DType`].
fn convert_safetensor_dtype(name: &str, st_dtype: safetensors::Dtype) -> Result<DType, ModelError> {
    match st_dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::I8 => Ok(DType::I8),
        other => Err(ModelError::WeightDType {
            name: name.into(),
            dtype: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelBuilder, Operator, TensorSpec};

    fn tiny_builder() -> ModelBuilder {
        ModelBuilder::new(
            "tiny",
            TensorSpec {
                name: "x".into(),
                shape: Shape::matrix(1, 3),
                dtype: DType::F32,
            },
        )
        .node(
            "fc",
            Operator::FullyConnected {
                weights: "fc.w".into(),
                bias: None,
                activation: Default::default(),
            },
        )
        .node("probs", Operator::Softmax { beta: 1.0 })
        .weight("fc.w", Shape::matrix(2, 3), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    #[test]
    fn test_load_matching_schema() {
        let blob = tiny_builder().build().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        assert_eq!(model.schema_version(), SCHEMA_VERSION);
        assert_eq!(model.weight_f32("fc.w").unwrap(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert!(model.summary().contains("1 weight tensors"));
    }

    #[test]
    fn test_schema_mismatch() {
        let blob = tiny_builder().schema_version("2").build().unwrap();
        match ModelDescriptor::load(blob.as_bytes()) {
            Err(ModelError::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, "2");
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_blob() {
        assert!(matches!(
            ModelDescriptor::load(&[0xFF; 16]),
            Err(ModelError::InvalidBlob(_))
        ));
        assert!(matches!(
            ModelDescriptor::load(&[]),
            Err(ModelError::InvalidBlob(_))
        ));
    }

    #[test]
    fn test_graph_validates_against_weights() {
        let blob = tiny_builder().build().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let graph = model.graph().unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.output().shape, Shape::matrix(1, 2));
    }

    #[test]
    fn test_missing_weight() {
        let blob = tiny_builder().build().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        assert!(matches!(
            model.weight_f32("nope"),
            Err(ModelError::WeightNotFound { .. })
        ));
    }
}

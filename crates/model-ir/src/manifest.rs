// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest.
//!
//! The manifest is stored in the blob's `__metadata__["graph"]` entry and
//! lists the model input and its nodes in execution order. Weight data is
//! not part of the manifest; weight-bearing nodes name tensors stored in
//! the same blob.
//!
//! # Format
//! ```json
//! {
//!   "name": "har-cnn",
//!   "input": { "name": "window", "shape": [1, 40, 3, 1], "dtype": "f32" },
//!   "nodes": [
//!     { "name": "conv1", "op": "conv_2d", "filter": "conv1.w", "bias": "conv1.b", "activation": "relu" },
//!     { "name": "pool1", "op": "max_pool_2d", "filter": [2, 1], "stride": [2, 1] },
//!     { "name": "flatten", "op": "reshape", "shape": [1, -1] },
//!     { "name": "fc", "op": "fully_connected", "weights": "fc.w", "bias": "fc.b" },
//!     { "name": "probs", "op": "softmax" }
//!   ]
//! }
//! ```

use crate::{ModelError, Operator};
use tensor_core::{DType, Shape};

/// Shape and element type of the graph input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorSpec {
    /// Input name, for diagnostics.
    pub name: String,
    /// NHWC shape.
    pub shape: Shape,
    /// Element type.
    #[serde(default = "default_dtype")]
    pub dtype: DType,
}

fn default_dtype() -> DType {
    DType::F32
}

/// A single node entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    /// Node name (unique within the graph).
    pub name: String,
    /// Operator and parameters.
    #[serde(flatten)]
    pub op: Operator,
}

/// Top-level graph manifest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    /// Human-readable model name.
    pub name: String,
    /// The single graph input.
    pub input: TensorSpec,
    /// Nodes in execution order; each consumes the previous node's output.
    pub nodes: Vec<NodeDef>,
}

impl ModelManifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Serializes the manifest to compact JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Validates that the manifest is internally consistent.
    ///
    /// Checks:
    /// - At least one node is defined.
    /// - No duplicate node names.
    /// - The input has a non-empty shape whose element count fits `usize`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidGraph("manifest contains no nodes".into()));
        }

        let elements = self.input.shape.checked_num_elements().ok_or_else(|| {
            ModelError::InvalidGraph(format!(
                "input shape {} overflows the element count",
                self.input.shape
            ))
        })?;
        if self.input.shape.rank() == 0 || elements == 0 {
            return Err(ModelError::InvalidNode {
                node: self.input.name.clone(),
                detail: format!("input shape {} is empty", self.input.shape),
            });
        }

        let mut seen_names = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen_names.insert(node.name.as_str()) {
                return Err(ModelError::InvalidNode {
                    node: node.name.clone(),
                    detail: "duplicate node name".into(),
                });
            }
        }

        Ok(())
    }

    /// Returns the unique weight tensor names referenced by the nodes.
    pub fn weight_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .flat_map(|n| n.op.weight_names())
            .filter(|w| seen.insert(*w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpKind;

    fn sample_manifest_json() -> &'static str {
        r#"{
            "name": "har-cnn",
            "input": { "name": "window", "shape": [1, 40, 3, 1] },
            "nodes": [
                { "name": "conv1", "op": "conv_2d", "filter": "conv1.w", "bias": "conv1.b", "activation": "relu" },
                { "name": "pool1", "op": "max_pool_2d", "filter": [2, 1], "stride": [2, 1] },
                { "name": "flatten", "op": "reshape", "shape": [1, -1] },
                { "name": "fc", "op": "fully_connected", "weights": "fc.w", "bias": "fc.b" },
                { "name": "probs", "op": "softmax" }
            ]
        }"#
    }

    #[test]
    fn test_parse_manifest() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.name, "har-cnn");
        assert_eq!(m.input.dtype, DType::F32);
        assert_eq!(m.input.shape, Shape::nhwc(1, 40, 3, 1));
        assert_eq!(m.nodes.len(), 5);
        assert_eq!(m.nodes[0].op.kind(), OpKind::Conv2d);
        assert_eq!(m.nodes[4].op.kind(), OpKind::Softmax);
    }

    #[test]
    fn test_validate_ok() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_nodes() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.nodes.clear();
        assert!(matches!(m.validate(), Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.nodes[1].name = "conv1".into();
        assert!(matches!(m.validate(), Err(ModelError::InvalidNode { .. })));
    }

    #[test]
    fn test_validate_overflowing_input() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.input.shape = Shape::nhwc(1 << 20, 1 << 20, 1 << 20, 1 << 20);
        assert!(matches!(m.validate(), Err(ModelError::InvalidGraph(_))));
        m.input.shape = Shape::nhwc(1, 0, 3, 1);
        assert!(matches!(m.validate(), Err(ModelError::InvalidNode { .. })));
    }

    #[test]
    fn test_weight_names_unique() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.weight_names(), vec!["conv1.w", "conv1.b", "fc.w", "fc.b"]);
    }

    #[test]
    fn test_json_survives_reserialization() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        let again = ModelManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(m, again);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ModelManifest::from_json("{ not json"),
            Err(ModelError::ManifestParseError(_))
        ));
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: an ordered chain of operator nodes.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>    : nodes parsed, not yet checked.
//!       │  .validate(weights)
//!       ▼
//! ModelGraph<Validated> : shapes inferred end to end, ready for a session.
//! ```
//!
//! Only a validated graph exposes its tensor table, so the session can
//! never plan arena memory for a graph whose shapes were not inferred.

use crate::{ModelError, ModelManifest, NodeDef, Operator, TensorSpec, WeightMeta};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tensor_core::{
    conv2d_output_shape, fully_connected_output_shape, max_pool2d_output_shape, pad_output_shape,
    reshape_output_shape, transpose_output_shape, Conv2dParams, DType, Pool2dParams, Shape,
};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been parsed but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph shapes have been inferred and checked.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

/// Shape and element type of one activation tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub shape: Shape,
    pub dtype: DType,
}

impl TensorInfo {
    fn f32(shape: Shape) -> Self {
        Self {
            shape,
            dtype: DType::F32,
        }
    }

    /// Size of the tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

/// Upper bound on the summed size of a graph's activations.
///
/// Matches the largest allocation Rust permits, so planned offsets and
/// aligned sizes cannot overflow `usize`.
pub const MAX_ACTIVATION_BYTES: usize = isize::MAX as usize;

// ── ModelGraph ─────────────────────────────────────────────────────

/// The model as a linear chain of nodes.
///
/// Node `i` reads activation tensor `i` and writes tensor `i + 1`;
/// tensor 0 is the graph input and the last tensor is the graph output.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name.
    pub name: String,
    /// The graph input.
    pub input: TensorSpec,
    /// Nodes in execution order.
    pub nodes: Vec<NodeDef>,
    tensors: Vec<TensorInfo>,
    weight_bytes: usize,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a graph in the `Loaded` state from a parsed manifest.
    pub fn new(manifest: ModelManifest) -> Self {
        Self {
            name: manifest.name,
            input: manifest.input,
            nodes: manifest.nodes,
            tensors: Vec::new(),
            weight_bytes: 0,
            _state: std::marker::PhantomData,
        }
    }

    /// Infers every activation shape and transitions to `Validated`.
    ///
    /// # Checks
    /// - The graph is non-empty and node names are unique.
    /// - Every referenced weight exists, is `f32`, and has the shape the
    ///   operator needs (filter channels, dense input features, bias length).
    /// - Each operator accepts the element type it is fed.
    /// - No activation has zero elements, and all of them together fit in
    ///   [`MAX_ACTIVATION_BYTES`].
    pub fn validate(
        self,
        weights: &HashMap<String, WeightMeta>,
    ) -> Result<ModelGraph<Validated>, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidGraph("model graph contains no nodes".into()));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(invalid(node, "duplicate node name"));
            }
        }

        let mut tensors = Vec::with_capacity(self.nodes.len() + 1);
        let mut current = TensorInfo {
            shape: self.input.shape.clone(),
            dtype: self.input.dtype,
        };
        let mut activation_bytes = match current.shape.checked_size_bytes(current.dtype) {
            Some(0) => {
                return Err(ModelError::InvalidGraph(format!(
                    "input '{}' has zero elements",
                    self.input.name
                )))
            }
            Some(bytes) if bytes <= MAX_ACTIVATION_BYTES => bytes,
            _ => {
                return Err(ModelError::InvalidGraph(format!(
                    "input '{}' shape {} overflows the addressable size",
                    self.input.name, current.shape
                )))
            }
        };

        for node in &self.nodes {
            let next = infer_node(node, &current, weights)?;
            let bytes = match next.shape.checked_size_bytes(next.dtype) {
                Some(0) => return Err(invalid(node, "output shape has zero elements")),
                Some(bytes) => bytes,
                None => {
                    return Err(invalid(
                        node,
                        format!("output shape {} overflows the addressable size", next.shape),
                    ))
                }
            };
            activation_bytes = activation_bytes
                .checked_add(bytes)
                .filter(|&total| total <= MAX_ACTIVATION_BYTES)
                .ok_or_else(|| {
                    ModelError::InvalidGraph(format!(
                        "activations exceed {MAX_ACTIVATION_BYTES} bytes at '{}'",
                        node.name
                    ))
                })?;
            tracing::trace!("{} ({}): {} -> {}", node.name, node.op.kind(), current.shape, next.shape);
            tensors.push(std::mem::replace(&mut current, next));
        }
        tensors.push(current);

        let mut counted = HashSet::new();
        let weight_bytes = self
            .nodes
            .iter()
            .flat_map(|n| n.op.weight_names())
            .filter(|w| counted.insert(*w))
            .filter_map(|w| weights.get(w))
            .map(|m| m.size_bytes)
            .sum();

        Ok(ModelGraph {
            name: self.name,
            input: self.input,
            nodes: self.nodes,
            tensors,
            weight_bytes,
            _state: std::marker::PhantomData,
        })
    }
}

fn invalid(node: &NodeDef, detail: impl ToString) -> ModelError {
    ModelError::InvalidNode {
        node: node.name.clone(),
        detail: detail.to_string(),
    }
}

fn expect_dtype(node: &NodeDef, input: &TensorInfo, want: DType) -> Result<(), ModelError> {
    if input.dtype != want {
        return Err(invalid(
            node,
            format!("{} expects {want} input, got {}", node.op.kind(), input.dtype),
        ));
    }
    Ok(())
}

fn lookup_weight<'w>(
    weights: &'w HashMap<String, WeightMeta>,
    name: &str,
) -> Result<&'w WeightMeta, ModelError> {
    let meta = weights
        .get(name)
        .ok_or_else(|| ModelError::WeightNotFound { name: name.into() })?;
    if meta.dtype != DType::F32 {
        return Err(ModelError::WeightDType {
            name: name.into(),
            dtype: meta.dtype.to_string(),
        });
    }
    Ok(meta)
}

fn check_bias(
    node: &NodeDef,
    weights: &HashMap<String, WeightMeta>,
    bias: Option<&str>,
    len: usize,
) -> Result<(), ModelError> {
    if let Some(name) = bias {
        let meta = lookup_weight(weights, name)?;
        if meta.shape != Shape::vector(len) {
            return Err(invalid(
                node,
                format!("bias '{name}' has shape {}, expected [{len}]", meta.shape),
            ));
        }
    }
    Ok(())
}

/// Infers the output of one node from its input.
fn infer_node(
    node: &NodeDef,
    input: &TensorInfo,
    weights: &HashMap<String, WeightMeta>,
) -> Result<TensorInfo, ModelError> {
    match &node.op {
        Operator::Conv2d {
            filter,
            bias,
            stride,
            padding,
            activation,
        } => {
            expect_dtype(node, input, DType::F32)?;
            let filter = lookup_weight(weights, filter)?;
            let params = Conv2dParams {
                stride: *stride,
                padding: *padding,
                activation: *activation,
            };
            let shape = conv2d_output_shape(&input.shape, &filter.shape, &params)
                .map_err(|e| invalid(node, e))?;
            check_bias(node, weights, bias.as_deref(), filter.shape.dims()[0])?;
            Ok(TensorInfo::f32(shape))
        }
        Operator::MaxPool2d {
            filter,
            stride,
            padding,
        } => {
            expect_dtype(node, input, DType::F32)?;
            let params = Pool2dParams {
                filter: *filter,
                stride: *stride,
                padding: *padding,
            };
            let shape =
                max_pool2d_output_shape(&input.shape, &params).map_err(|e| invalid(node, e))?;
            Ok(TensorInfo::f32(shape))
        }
        Operator::Relu | Operator::Softmax { .. } => {
            expect_dtype(node, input, DType::F32)?;
            Ok(input.clone())
        }
        Operator::FullyConnected { weights: w, bias, .. } => {
            expect_dtype(node, input, DType::F32)?;
            let meta = lookup_weight(weights, w)?;
            let shape = fully_connected_output_shape(&input.shape, &meta.shape)
                .map_err(|e| invalid(node, e))?;
            check_bias(node, weights, bias.as_deref(), shape.dims()[1])?;
            Ok(TensorInfo::f32(shape))
        }
        Operator::Reshape { shape } => {
            let shape = reshape_output_shape(&input.shape, shape).map_err(|e| invalid(node, e))?;
            Ok(TensorInfo {
                shape,
                dtype: input.dtype,
            })
        }
        Operator::Pad { paddings } => {
            expect_dtype(node, input, DType::F32)?;
            let shape = pad_output_shape(&input.shape, paddings).map_err(|e| invalid(node, e))?;
            Ok(TensorInfo::f32(shape))
        }
        Operator::Transpose { perm } => {
            expect_dtype(node, input, DType::F32)?;
            let shape = transpose_output_shape(&input.shape, perm).map_err(|e| invalid(node, e))?;
            Ok(TensorInfo::f32(shape))
        }
        Operator::Dequantize { scale, .. } => {
            expect_dtype(node, input, DType::I8)?;
            if !scale.is_finite() || *scale <= 0.0 {
                return Err(invalid(node, format!("scale {scale} must be finite and positive")));
            }
            Ok(TensorInfo::f32(input.shape.clone()))
        }
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a node by index.
    pub fn node(&self, index: usize) -> Option<&NodeDef> {
        self.nodes.get(index)
    }

    /// Returns an iterator over the nodes in execution order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeDef> {
        self.nodes.iter()
    }

    /// Activation tensors: index 0 is the input, `i + 1` is node `i`'s output.
    pub fn tensors(&self) -> &[TensorInfo] {
        &self.tensors
    }

    /// The graph output tensor.
    pub fn output(&self) -> &TensorInfo {
        // Validation always pushes the input plus one tensor per node.
        &self.tensors[self.tensors.len() - 1]
    }

    /// Total bytes of the distinct weights the graph references.
    pub fn total_weight_bytes(&self) -> usize {
        self.weight_bytes
    }

    /// Sum of every activation tensor's size, i.e. the arena a planner
    /// without reuse would need (before alignment padding).
    pub fn total_activation_bytes(&self) -> usize {
        self.tensors.iter().map(TensorInfo::size_bytes).sum()
    }

    /// Largest input-plus-output pair live during any single node.
    pub fn peak_live_bytes(&self) -> usize {
        self.tensors
            .windows(2)
            .map(|w| w[0].size_bytes() + w[1].size_bytes())
            .max()
            .unwrap_or(0)
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} nodes, input {} -> output {}, {:.1} KB weights, peak live activations {:.1} KB",
            self.name,
            self.num_nodes(),
            self.input.shape,
            self.output().shape,
            self.total_weight_bytes() as f64 / 1024.0,
            self.peak_live_bytes() as f64 / 1024.0,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            match self.tensors.get(i + 1) {
                Some(out) => writeln!(f, "  [{i}] {} ({}) -> {}", node.name, node.op.kind(), out.shape)?,
                None => writeln!(f, "  [{i}] {} ({})", node.name, node.op.kind())?,
            }
        }
        Ok(())
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference session: a validated graph bound to a scratch arena.
//!
//! ```text
//! InferenceSession::build(model, registry, arena, planner)
//!     │  graph validated, ops checked against registry, weights resolved
//!     ▼
//! .allocate_tensors()     planner places every activation in the arena
//!     │
//!     ▼
//! .input(0) / .invoke() / .output(0)
//! ```
//!
//! The session mutably borrows the arena, so the arena cannot be released
//! (or handed to anyone else) while the session is alive. Weights are
//! borrowed straight from the model blob; nothing is copied.
//!
//! Tensor `0` is the graph input, tensor `i + 1` is node `i`'s output, and
//! the last tensor is the graph output.

use crate::RuntimeError;
use arena_planner::{ArenaLayout, MemoryPlanner, TensorRequest};
use memory_manager::ScratchArena;
use model_ir::{graph::Validated, ModelDescriptor, ModelGraph, NodeDef, Operator, OperatorRegistry};
use std::ops::Range;
use tensor_core::{DType, Shape, TensorError, TensorView, TensorViewMut};

/// A weight tensor borrowed from the model blob.
#[derive(Debug)]
struct BoundWeight<'a> {
    shape: Shape,
    data: &'a [u8],
}

impl BoundWeight<'_> {
    fn view(&self) -> Result<TensorView<'_>, TensorError> {
        TensorView::new(&self.shape, DType::F32, self.data)
    }
}

/// The weights one node reads: the filter or dense matrix, and a bias.
#[derive(Debug, Default)]
struct NodeWeights<'a> {
    kernel: Option<BoundWeight<'a>>,
    bias: Option<BoundWeight<'a>>,
}

/// A model ready to run inside one scratch arena.
pub struct InferenceSession<'a> {
    graph: ModelGraph<Validated>,
    weights: Vec<NodeWeights<'a>>,
    arena: &'a mut ScratchArena,
    planner: Box<dyn MemoryPlanner>,
    layout: Option<ArenaLayout>,
}

impl<'a> InferenceSession<'a> {
    /// Binds `model` to `arena`.
    ///
    /// Validates the graph, rejects any node whose operator is not in
    /// `registry`, and resolves every weight reference. Arena memory is
    /// not touched until [`allocate_tensors`](Self::allocate_tensors).
    pub fn build<'m: 'a, const N: usize>(
        model: &ModelDescriptor<'m>,
        registry: &OperatorRegistry<N>,
        arena: &'a mut ScratchArena,
        planner: Box<dyn MemoryPlanner>,
    ) -> Result<Self, RuntimeError> {
        let graph = model.graph()?;

        for node in graph.iter_nodes() {
            let op = node.op.kind();
            if !registry.contains(op) {
                return Err(RuntimeError::UnsupportedOp {
                    node: node.name.clone(),
                    op,
                });
            }
        }

        let meta = model.weight_metadata()?;
        let bind = |name: &str| -> Result<BoundWeight<'a>, RuntimeError> {
            let shape = meta
                .get(name)
                .map(|m| m.shape.clone())
                .ok_or_else(|| model_ir::ModelError::WeightNotFound { name: name.into() })?;
            let values: &'a [f32] = model.weight_f32(name)?;
            Ok(BoundWeight {
                shape,
                data: bytemuck::cast_slice(values),
            })
        };

        let weights = graph
            .iter_nodes()
            .map(|node| -> Result<NodeWeights<'a>, RuntimeError> {
                match &node.op {
                    Operator::Conv2d { filter, bias, .. } => Ok(NodeWeights {
                        kernel: Some(bind(filter.as_str())?),
                        bias: bias.as_deref().map(&bind).transpose()?,
                    }),
                    Operator::FullyConnected { weights, bias, .. } => Ok(NodeWeights {
                        kernel: Some(bind(weights.as_str())?),
                        bias: bias.as_deref().map(&bind).transpose()?,
                    }),
                    _ => Ok(NodeWeights::default()),
                }
            })
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        tracing::debug!(
            "session built for '{}': {} nodes, planner '{}'",
            graph.name,
            graph.num_nodes(),
            planner.name()
        );

        Ok(Self {
            graph,
            weights,
            arena,
            planner,
            layout: None,
        })
    }

    /// Returns the validated graph.
    pub fn graph(&self) -> &ModelGraph<Validated> {
        &self.graph
    }

    /// Plans every activation tensor into the arena.
    ///
    /// The input stays live for the whole pass, so repeated invocations see
    /// the same sample; intermediates live from their producer to their
    /// consumer.
    ///
    /// # Errors
    /// [`RuntimeError::TensorAllocation`] with
    /// [`arena_planner::PlannerError::ArenaTooSmall`] when the working set
    /// does not fit.
    pub fn allocate_tensors(&mut self) -> Result<(), RuntimeError> {
        let last = self.graph.num_nodes().saturating_sub(1);
        let requests: Vec<TensorRequest> = self
            .graph
            .tensors()
            .iter()
            .enumerate()
            .map(|(i, info)| match i {
                0 => TensorRequest::new(info.size_bytes(), 0, last),
                i => TensorRequest::new(info.size_bytes(), i - 1, i.min(last)),
            })
            .collect();

        let layout = self.planner.plan(&requests, self.arena.size_bytes())?;
        tracing::info!("{}", layout.summary());
        self.layout = Some(layout);
        Ok(())
    }

    /// Returns `true` once [`allocate_tensors`](Self::allocate_tensors) succeeded.
    pub fn is_allocated(&self) -> bool {
        self.layout.is_some()
    }

    /// Arena bytes used by the tensor layout.
    pub fn arena_used_bytes(&self) -> Option<usize> {
        self.layout.as_ref().map(|l| l.total_bytes)
    }

    /// Writable view of the input tensor. Only index 0 exists.
    pub fn input(&mut self, index: usize) -> Result<TensorViewMut<'_>, RuntimeError> {
        check_index(index)?;
        let range = self.tensor_range(0)?;
        let info = &self.graph.tensors()[0];
        let bytes = &mut self.arena.as_bytes_mut()[range];
        Ok(TensorViewMut::new(&info.shape, info.dtype, bytes)?)
    }

    /// Read-only view of the output tensor. Only index 0 exists.
    pub fn output(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        check_index(index)?;
        let last = self.graph.tensors().len() - 1;
        let range = self.tensor_range(last)?;
        let info = self.graph.output();
        Ok(TensorView::new(&info.shape, info.dtype, &self.arena.as_bytes()[range])?)
    }

    /// Runs one forward pass over the graph.
    ///
    /// # Errors
    /// [`RuntimeError::Invoke`] naming the failing node. The session and
    /// the arena remain safe to drop.
    pub fn invoke(&mut self) -> Result<(), RuntimeError> {
        if self.layout.is_none() {
            return Err(RuntimeError::TensorsNotAllocated);
        }

        for (i, node) in self.graph.iter_nodes().enumerate() {
            let in_range = self.tensor_range(i)?;
            let out_range = self.tensor_range(i + 1)?;
            let fault = |source| RuntimeError::Invoke {
                node: node.name.clone(),
                source,
            };

            let (in_bytes, out_bytes) = split_disjoint(self.arena.as_bytes_mut(), in_range, out_range)
                .ok_or_else(|| {
                    fault(TensorError::InvalidParams {
                        op: "invoke",
                        detail: "input and output tensors overlap in the arena".into(),
                    })
                })?;

            let tensors = self.graph.tensors();
            let (in_info, out_info) = (&tensors[i], &tensors[i + 1]);
            let input = TensorView::new(&in_info.shape, in_info.dtype, in_bytes).map_err(fault)?;
            let mut output =
                TensorViewMut::new(&out_info.shape, out_info.dtype, out_bytes).map_err(fault)?;

            run_node(node, &self.weights[i], &input, &mut output).map_err(fault)?;
        }
        Ok(())
    }

    fn tensor_range(&self, tensor: usize) -> Result<Range<usize>, RuntimeError> {
        let layout = self.layout.as_ref().ok_or(RuntimeError::TensorsNotAllocated)?;
        let offset = layout.offset(tensor).ok_or(RuntimeError::TensorIndex {
            index: tensor,
            count: layout.len(),
        })?;
        let size = self.graph.tensors()[tensor].size_bytes();
        Ok(offset..offset + size)
    }
}

impl std::fmt::Debug for InferenceSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceSession")
            .field("model", &self.graph.name)
            .field("nodes", &self.graph.num_nodes())
            .field("arena", &self.arena)
            .field("planner", &self.planner.name())
            .field("arena_used_bytes", &self.arena_used_bytes())
            .finish()
    }
}

fn check_index(index: usize) -> Result<(), RuntimeError> {
    if index != 0 {
        return Err(RuntimeError::TensorIndex { index, count: 1 });
    }
    Ok(())
}

/// Splits `arena` into a shared `a` and an exclusive `b`. Returns `None`
/// if the ranges overlap.
fn split_disjoint(
    arena: &mut [u8],
    a: Range<usize>,
    b: Range<usize>,
) -> Option<(&[u8], &mut [u8])> {
    if a.end <= b.start {
        let (lo, hi) = arena.split_at_mut(b.start);
        Some((lo.get(a)?, hi.get_mut(..b.len())?))
    } else if b.end <= a.start {
        let (lo, hi) = arena.split_at_mut(a.start);
        let a_len = a.len();
        Some((hi.get(..a_len)?, lo.get_mut(b)?))
    } else {
        None
    }
}

/// Dispatches one node to its kernel.
fn run_node(
    node: &NodeDef,
    weights: &NodeWeights<'_>,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let kernel = || {
        weights.kernel.as_ref().ok_or_else(|| TensorError::InvalidParams {
            op: node.op.kind().as_str(),
            detail: "weights not bound".into(),
        })
    };
    let bias = weights.bias.as_ref().map(BoundWeight::view).transpose()?;

    match &node.op {
        Operator::Conv2d { .. } => {
            let params = node.op.conv2d_params().unwrap_or_default();
            tensor_core::conv2d(input, &kernel()?.view()?, bias.as_ref(), &params, output)
        }
        Operator::MaxPool2d { filter, stride, padding } => tensor_core::max_pool2d(
            input,
            &tensor_core::Pool2dParams {
                filter: *filter,
                stride: *stride,
                padding: *padding,
            },
            output,
        ),
        Operator::Relu => tensor_core::relu(input, output),
        Operator::FullyConnected { activation, .. } => {
            tensor_core::fully_connected(input, &kernel()?.view()?, bias.as_ref(), *activation, output)
        }
        Operator::Reshape { .. } => tensor_core::reshape(input, output),
        Operator::Softmax { beta } => tensor_core::softmax(input, *beta, output),
        Operator::Pad { paddings } => tensor_core::pad(input, paddings, output),
        Operator::Transpose { perm } => tensor_core::transpose(input, perm, output),
        Operator::Dequantize { scale, zero_point } => {
            tensor_core::dequantize(input, *scale, *zero_point, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use arena_planner::{GreedyPlanner, LinearPlanner, PlannerError};
    use memory_manager::{MemoryBudget, MemoryPool};
    use model_ir::{register_supported_ops, ModelBuilder, OpKind, TensorSpec};

    fn pool() -> MemoryPool {
        MemoryPool::external(MemoryBudget::from_mb(1))
    }

    fn arena(pool: &MemoryPool, kb: usize) -> ScratchArena {
        ScratchArena::acquire(pool, MemoryBudget::from_kb(kb)).unwrap()
    }

    #[test]
    fn test_demo_model_end_to_end() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let mut arena = arena(&pool, 700);

        let mut session =
            InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
                .unwrap();
        session.allocate_tensors().unwrap();

        let sample = demo::test_vector();
        let mut input = session.input(0).unwrap();
        assert_eq!(input.bytes(), sample.len() * 4);
        input.as_bytes_mut().copy_from_slice(bytemuck::cast_slice(&sample));

        session.invoke().unwrap();
        let scores = session.output(0).unwrap().f32_data("test").unwrap().to_vec();
        assert_eq!(scores.len(), 5);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(session.arena_used_bytes().unwrap() <= 700 * 1024);
    }

    #[test]
    fn test_planners_agree_on_output() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let sample = demo::test_vector();

        let mut results = Vec::new();
        for planner in [
            Box::new(GreedyPlanner::new()) as Box<dyn MemoryPlanner>,
            Box::new(LinearPlanner::new()),
        ] {
            let mut arena = arena(&pool, 700);
            let mut session = InferenceSession::build(&model, &registry, &mut arena, planner).unwrap();
            session.allocate_tensors().unwrap();
            session
                .input(0)
                .unwrap()
                .as_bytes_mut()
                .copy_from_slice(bytemuck::cast_slice(&sample));
            session.invoke().unwrap();
            results.push(session.output(0).unwrap().f32_data("test").unwrap().to_vec());
        }
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_access_before_allocation() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let mut arena = arena(&pool, 700);
        let mut session =
            InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
                .unwrap();

        assert!(matches!(session.input(0), Err(RuntimeError::TensorsNotAllocated)));
        assert!(matches!(session.output(0), Err(RuntimeError::TensorsNotAllocated)));
        assert!(matches!(session.invoke(), Err(RuntimeError::TensorsNotAllocated)));
    }

    #[test]
    fn test_tensor_index_out_of_range() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let mut arena = arena(&pool, 700);
        let mut session =
            InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
                .unwrap();
        session.allocate_tensors().unwrap();
        assert!(matches!(
            session.input(1),
            Err(RuntimeError::TensorIndex { index: 1, count: 1 })
        ));
        assert!(matches!(
            session.output(2),
            Err(RuntimeError::TensorIndex { index: 2, .. })
        ));
    }

    #[test]
    fn test_arena_too_small() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let mut arena = arena(&pool, 1);
        let mut session =
            InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
                .unwrap();
        let err = session.allocate_tensors().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TensorAllocation(PlannerError::ArenaTooSmall { available: 1024, .. })
        ));
        assert!(!session.is_allocated());
    }

    #[test]
    fn test_unsupported_op_rejected() {
        let blob = demo::model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let mut registry: OperatorRegistry = OperatorRegistry::new();
        for op in [OpKind::Conv2d, OpKind::MaxPool2d, OpKind::Reshape, OpKind::FullyConnected] {
            registry.add(op).unwrap();
        }
        let pool = pool();
        let mut arena = arena(&pool, 700);
        let err = InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
            .unwrap_err();
        match err {
            RuntimeError::UnsupportedOp { node, op } => {
                assert_eq!(node, "probs");
                assert_eq!(op, OpKind::Softmax);
            }
            other => panic!("expected UnsupportedOp, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_input_fails_invoke() {
        let blob = ModelBuilder::new(
            "probs-only",
            TensorSpec {
                name: "logits".into(),
                shape: Shape::matrix(1, 5),
                dtype: DType::F32,
            },
        )
        .node("probs", Operator::Softmax { beta: 1.0 })
        .build()
        .unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let registry = register_supported_ops().unwrap();
        let pool = pool();
        let mut arena = arena(&pool, 1);
        let mut session =
            InferenceSession::build(&model, &registry, &mut arena, Box::new(LinearPlanner::new()))
                .unwrap();
        session.allocate_tensors().unwrap();
        session
            .input(0)
            .unwrap()
            .as_bytes_mut()
            .copy_from_slice(bytemuck::cast_slice(&[0.1f32, f32::NAN, 0.2, 0.3, 0.4]));
        match session.invoke() {
            Err(RuntimeError::Invoke { node, source }) => {
                assert_eq!(node, "probs");
                assert!(matches!(source, TensorError::Numeric { .. }));
            }
            other => panic!("expected Invoke error, got {other:?}"),
        }
    }

    #[test]
    fn test_split_disjoint() {
        let mut buf = [0u8; 64];
        let (a, b) = split_disjoint(&mut buf, 0..16, 32..48).unwrap();
        assert_eq!((a.len(), b.len()), (16, 16));
        let (a, b) = split_disjoint(&mut buf, 32..64, 0..16).unwrap();
        assert_eq!((a.len(), b.len()), (32, 16));
        assert!(split_disjoint(&mut buf, 0..32, 16..48).is_none());
    }
}

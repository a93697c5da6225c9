// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A built-in activity-recognition model and test window.
//!
//! The network reads a 40-sample window of 3-axis accelerometer data and
//! scores five activities:
//!
//! ```text
//! window [1,40,3,1]
//!   conv1   3x3 conv, 8 filters, same padding, relu   -> [1,40,3,8]
//!   pool1   2x1 max pool                              -> [1,20,3,8]
//!   flatten                                           -> [1,480]
//!   fc      dense, 5 units                            -> [1,5]
//!   probs   softmax                                   -> [1,5]
//! ```
//!
//! Weights are generated from a fixed seed so every build of the blob is
//! byte-identical.

use model_ir::{ModelBlob, ModelBuilder, ModelError, Operator, TensorSpec};
use tensor_core::{Activation, DType, Padding, Shape};

pub const WINDOW_LEN: usize = 40;
pub const AXES: usize = 3;
pub const CLASSES: usize = 5;
const FILTERS: usize = 8;
const SEED: u64 = 0x5eed_cafe_f00d_0001;

/// Input shape of the demo model.
pub fn input_shape() -> Shape {
    Shape::nhwc(1, WINDOW_LEN, AXES, 1)
}

/// Small linear congruential generator; uniform in `[-scale, scale)`.
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self, scale: f32) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let unit = (self.0 >> 40) as f32 / (1u64 << 24) as f32;
        (unit * 2.0 - 1.0) * scale
    }

    fn fill(&mut self, len: usize, scale: f32) -> Vec<f32> {
        (0..len).map(|_| self.next_f32(scale)).collect()
    }
}

/// The demo model builder, before serialization.
pub fn model_builder() -> ModelBuilder {
    let mut rng = Lcg(SEED);
    let fc_in = (WINDOW_LEN / 2) * AXES * FILTERS;

    ModelBuilder::new(
        "har-cnn",
        TensorSpec {
            name: "window".into(),
            shape: input_shape(),
            dtype: DType::F32,
        },
    )
    .node(
        "conv1",
        Operator::Conv2d {
            filter: "conv1.w".into(),
            bias: Some("conv1.b".into()),
            stride: [1, 1],
            padding: Padding::Same,
            activation: Activation::Relu,
        },
    )
    .node(
        "pool1",
        Operator::MaxPool2d {
            filter: [2, 1],
            stride: [2, 1],
            padding: Padding::Valid,
        },
    )
    .node("flatten", Operator::Reshape { shape: vec![1, -1] })
    .node(
        "fc",
        Operator::FullyConnected {
            weights: "fc.w".into(),
            bias: Some("fc.b".into()),
            activation: Activation::None,
        },
    )
    .node("probs", Operator::Softmax { beta: 1.0 })
    .weight("conv1.w", Shape::nhwc(FILTERS, 3, 3, 1), rng.fill(FILTERS * 9, 0.5))
    .weight("conv1.b", Shape::vector(FILTERS), rng.fill(FILTERS, 0.1))
    .weight("fc.w", Shape::matrix(CLASSES, fc_in), rng.fill(CLASSES * fc_in, 0.1))
    .weight("fc.b", Shape::vector(CLASSES), rng.fill(CLASSES, 0.1))
}

/// Serializes the demo model.
pub fn model_blob() -> Result<ModelBlob, ModelError> {
    model_builder().build()
}

/// A 40x3 accelerometer window, row-major (sample, axis).
///
/// Roughly a walking gait: a slow vertical oscillation on z over gravity,
/// with smaller out-of-phase sway on x and y.
pub fn test_vector() -> Vec<f32> {
    (0..WINDOW_LEN)
        .flat_map(|t| {
            let phase = t as f32 * std::f32::consts::TAU / 20.0;
            [
                0.3 * phase.sin(),
                0.2 * (phase + 1.3).cos(),
                1.0 + 0.5 * (2.0 * phase).sin(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::ModelDescriptor;

    #[test]
    fn test_demo_blob_is_deterministic() {
        let a = model_blob().unwrap();
        let b = model_blob().unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_demo_graph_shapes() {
        let blob = model_blob().unwrap();
        let model = ModelDescriptor::load(blob.as_bytes()).unwrap();
        let graph = model.graph().unwrap();
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.tensors()[0].shape, input_shape());
        assert_eq!(graph.output().shape, Shape::matrix(1, CLASSES));
    }

    #[test]
    fn test_vector_matches_input() {
        let v = test_vector();
        assert_eq!(v.len(), input_shape().num_elements());
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = Lcg(1);
        assert!(rng.fill(1000, 0.5).iter().all(|v| (-0.5..0.5).contains(v)));
    }
}

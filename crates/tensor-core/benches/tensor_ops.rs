// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the CNN kernels at the sizes the demo model uses.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_core::{
    conv2d, fully_connected, softmax, Activation, Conv2dParams, DType, Shape, Tensor,
};

fn ramp(shape: Shape) -> Tensor {
    let n = shape.num_elements();
    let values: Vec<f32> = (0..n).map(|i| ((i % 17) as f32 - 8.0) * 0.05).collect();
    Tensor::from_f32(shape, &values).unwrap()
}

fn bench_conv2d(c: &mut Criterion) {
    let input = ramp(Shape::nhwc(1, 40, 3, 1));
    let filter = ramp(Shape::nhwc(8, 3, 3, 1));
    let bias = ramp(Shape::vector(8));
    let params = Conv2dParams {
        activation: Activation::Relu,
        ..Default::default()
    };
    let mut out = Tensor::zeros(Shape::nhwc(1, 40, 3, 8), DType::F32);

    c.bench_function("conv2d_40x3x1_to_8", |b| {
        b.iter(|| {
            conv2d(
                black_box(&input.view()),
                &filter.view(),
                Some(&bias.view()),
                &params,
                &mut out.view_mut(),
            )
            .unwrap()
        })
    });
}

fn bench_fully_connected(c: &mut Criterion) {
    let input = ramp(Shape::matrix(1, 960));
    let weights = ramp(Shape::matrix(64, 960));
    let mut out = Tensor::zeros(Shape::matrix(1, 64), DType::F32);

    c.bench_function("fully_connected_960_to_64", |b| {
        b.iter(|| {
            fully_connected(
                black_box(&input.view()),
                &weights.view(),
                None,
                Activation::Relu,
                &mut out.view_mut(),
            )
            .unwrap()
        })
    });
}

fn bench_softmax(c: &mut Criterion) {
    let input = ramp(Shape::matrix(1, 5));
    let mut out = Tensor::zeros(Shape::matrix(1, 5), DType::F32);

    c.bench_function("softmax_5", |b| {
        b.iter(|| softmax(black_box(&input.view()), 1.0, &mut out.view_mut()).unwrap())
    });
}

criterion_group!(benches, bench_conv2d, bench_fully_connected, bench_softmax);
criterion_main!(benches);

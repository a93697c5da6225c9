// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for arena planning and a forward pass of the demo model.

use arena_planner::{GreedyPlanner, LinearPlanner, MemoryPlanner};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use memory_manager::{MemoryBudget, MemoryPool, ScratchArena};
use model_ir::{register_supported_ops, ModelDescriptor};
use runtime::{bind_input_f32, demo, reduce_scores, InferenceSession};

fn bench_invoke(c: &mut Criterion) {
    let blob = demo::model_blob().expect("demo model");
    let model = ModelDescriptor::load(blob.as_bytes()).expect("load");
    let registry = register_supported_ops().expect("registry");
    let pool = MemoryPool::external(MemoryBudget::from_mb(1));
    let mut arena = ScratchArena::acquire(&pool, MemoryBudget::from_kb(700)).expect("arena");
    let mut session =
        InferenceSession::build(&model, &registry, &mut arena, Box::new(GreedyPlanner::new()))
            .expect("session");
    session.allocate_tensors().expect("allocate");
    bind_input_f32(&mut session.input(0).expect("input"), &demo::test_vector()).expect("bind");

    c.bench_function("invoke/har-cnn", |b| {
        b.iter(|| session.invoke().expect("invoke"));
    });
}

fn bench_allocate(c: &mut Criterion) {
    let blob = demo::model_blob().expect("demo model");
    let model = ModelDescriptor::load(blob.as_bytes()).expect("load");
    let registry = register_supported_ops().expect("registry");
    let pool = MemoryPool::external(MemoryBudget::from_mb(1));

    let mut group = c.benchmark_group("allocate_tensors");
    for name in ["greedy", "linear"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, &name| {
            b.iter(|| {
                let planner: Box<dyn MemoryPlanner> = match name {
                    "greedy" => Box::new(GreedyPlanner::new()),
                    _ => Box::new(LinearPlanner::new()),
                };
                let mut arena =
                    ScratchArena::acquire(&pool, MemoryBudget::from_kb(700)).expect("arena");
                let mut session =
                    InferenceSession::build(&model, &registry, &mut arena, planner).expect("session");
                session.allocate_tensors().expect("allocate");
            });
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let scores = [0.05f32, 0.10, 0.80, 0.03, 0.02];
    c.bench_function("reduce_scores/5", |b| {
        b.iter(|| reduce_scores(criterion::black_box(&scores), 5));
    });
}

criterion_group!(benches, bench_invoke, bench_allocate, bench_reduce);
criterion_main!(benches);

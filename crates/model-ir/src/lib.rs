// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The serialized model format and the intermediate representation the
//! micro-interpreter runs.
//!
//! - [`ModelDescriptor`]: a borrowed, schema-checked view over a model blob.
//! - [`ModelManifest`] / [`NodeDef`]: the JSON graph stored inside the blob.
//! - [`ModelGraph`]: the node chain with a **type-state pattern**
//!   (`Loaded` → `Validated`); validation infers every activation shape.
//! - [`OpKind`] / [`Operator`]: the closed operator set.
//! - [`OperatorRegistry`]: the fixed-capacity table of kernels a session
//!   may use.
//! - [`ModelBuilder`] / [`ModelBlob`] / [`ModelFile`]: writing blobs and
//!   mapping them from disk.
//!
//! # Model Format
//! A model is a single SafeTensors file:
//! - `__metadata__["schema_version"]`: must equal [`SCHEMA_VERSION`].
//! - `__metadata__["graph"]`: the JSON manifest.
//! - tensors: f32 weights, referenced from the manifest by name.
//!
//! # Example
//! ```no_run
//! use model_ir::{ModelDescriptor, ModelFile};
//! use std::path::Path;
//!
//! let file = ModelFile::open(Path::new("./har-cnn.safetensors")).unwrap();
//! let model = ModelDescriptor::load(file.as_bytes()).unwrap();
//! let graph = model.graph().unwrap();
//! println!("{}", graph.summary());
//! ```

mod builder;
mod descriptor;
mod error;
mod file;
pub mod graph;
pub(crate) mod manifest;
mod op;
mod registry;

pub use builder::{ModelBlob, ModelBuilder};
pub use descriptor::{ModelDescriptor, WeightMeta, GRAPH_KEY, SCHEMA_KEY, SCHEMA_VERSION};
pub use error::{ModelError, RegistryError};
pub use file::ModelFile;
pub use graph::{ModelGraph, TensorInfo, MAX_ACTIVATION_BYTES};
pub use manifest::{ModelManifest, NodeDef, TensorSpec};
pub use op::{OpKind, Operator};
pub use registry::{register_supported_ops, OperatorRegistry, OP_CAPACITY, SUPPORTED_OPS};

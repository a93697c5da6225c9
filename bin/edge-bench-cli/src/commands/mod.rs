// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommands and the helpers they share.

pub mod export;
pub mod inspect;
pub mod run;

use anyhow::Context;
use model_ir::{ModelBlob, ModelFile};
use runtime::BenchmarkConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

/// Reads the config file if one was given, otherwise the built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BenchmarkConfig> {
    match path {
        Some(path) => BenchmarkConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => Ok(BenchmarkConfig::default()),
    }
}

/// Model bytes: a memory-mapped file or the built-in model.
pub enum ModelSource {
    File(ModelFile),
    Builtin(ModelBlob),
}

impl ModelSource {
    pub fn open(path: Option<PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let file = ModelFile::open(&path)
                    .with_context(|| format!("failed to open model '{}'", path.display()))?;
                Ok(Self::File(file))
            }
            None => {
                tracing::info!("no --model given, using the built-in model");
                Ok(Self::Builtin(runtime::demo::model_blob()?))
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::File(file) => file.as_bytes(),
            Self::Builtin(blob) => blob.as_bytes(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::File(file) => file.path().display().to_string(),
            Self::Builtin(_) => "<built-in har-cnn>".to_string(),
        }
    }
}

/// Decodes a raw little-endian f32 file.
pub fn read_f32_file(path: &Path) -> anyhow::Result<Vec<f32>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read input '{}'", path.display()))?;
    decode_f32_le(&bytes).with_context(|| format!("bad input file '{}'", path.display()))
}

fn decode_f32_le(bytes: &[u8]) -> anyhow::Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        anyhow::bail!("{} bytes is not a whole number of f32 values", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encodes values as raw little-endian f32.
pub fn encode_f32_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

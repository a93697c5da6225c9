// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `edge-bench export-demo`: write the built-in model, its test window and
//! a default configuration, ready for `run --model --input --config`.

use super::encode_f32_le;
use anyhow::Context;
use runtime::BenchmarkConfig;
use std::path::{Path, PathBuf};

pub const MODEL_FILE: &str = "har-cnn.safetensors";
pub const INPUT_FILE: &str = "window.f32";
pub const CONFIG_FILE: &str = "edge-bench.toml";

pub async fn execute(out_dir: PathBuf) -> anyhow::Result<()> {
    let written = export(&out_dir)?;
    for path in written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn export(out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create '{}'", out_dir.display()))?;

    let model = out_dir.join(MODEL_FILE);
    runtime::demo::model_blob()?.write_to(&model)?;

    let input = out_dir.join(INPUT_FILE);
    std::fs::write(&input, encode_f32_le(&runtime::demo::test_vector()))?;

    let config = out_dir.join(CONFIG_FILE);
    std::fs::write(&config, BenchmarkConfig::default().to_toml()?)?;

    tracing::info!("demo exported to {}", out_dir.display());
    Ok(vec![model, input, config])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{load_config, read_f32_file, ModelSource};
    use model_ir::ModelDescriptor;

    #[test]
    fn test_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let written = export(dir.path()).unwrap();
        assert_eq!(written.len(), 3);

        let source = ModelSource::open(Some(dir.path().join(MODEL_FILE))).unwrap();
        let model = ModelDescriptor::load(source.as_bytes()).unwrap();
        assert_eq!(model.graph().unwrap().num_nodes(), 5);

        let input = read_f32_file(&dir.path().join(INPUT_FILE)).unwrap();
        assert_eq!(input, runtime::demo::test_vector());

        let config = load_config(Some(&dir.path().join(CONFIG_FILE))).unwrap();
        assert_eq!(config, BenchmarkConfig::default());
    }
}

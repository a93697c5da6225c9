// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory-mapped model files.

use crate::ModelError;
use std::path::{Path, PathBuf};

/// A model blob mapped read-only from disk.
///
/// The mapping is page aligned, so weight slices borrowed through a
/// [`crate::ModelDescriptor`] over it can be cast to `f32` without copying.
pub struct ModelFile {
    path: PathBuf,
    mmap: memmap2::Mmap,
}

impl ModelFile {
    /// Opens and maps `path`.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and the harness never writes the
        // model file while a run is in progress.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        tracing::debug!("mapped {} ({} bytes)", path.display(), mmap.len());
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// The mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// The file this mapping was created from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for ModelFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFile")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelBuilder, ModelDescriptor, Operator, TensorSpec};
    use tensor_core::{DType, Shape};

    #[test]
    fn test_open_mapped_model() {
        let blob = ModelBuilder::new(
            "mapped",
            TensorSpec {
                name: "x".into(),
                shape: Shape::matrix(1, 4),
                dtype: DType::F32,
            },
        )
        .node("probs", Operator::Softmax { beta: 1.0 })
        .weight("unused", Shape::vector(2), vec![0.5, -0.5])
        .build()
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.safetensors");
        blob.write_to(&path).unwrap();

        let file = ModelFile::open(&path).unwrap();
        assert_eq!(file.path(), path.as_path());
        let model = ModelDescriptor::load(file.as_bytes()).unwrap();
        assert_eq!(model.weight_f32("unused").unwrap(), &[0.5, -0.5]);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            ModelFile::open(Path::new("/definitely/not/here.safetensors")),
            Err(ModelError::Io(_))
        ));
    }
}

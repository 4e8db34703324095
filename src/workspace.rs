//! On-disk layout of a pipeline run.
//!
//! One directory holds the live module, its `_buggy` and `_fixed` snapshots
//! and the test file, all named after `TaskSpec::filename`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::schema::{SnapshotTag, TaskSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

/// Locations of everything a run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub live: PathBuf,
    pub buggy: PathBuf,
    pub fixed: PathBuf,
    pub tests: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root).map_err(|err| PipelineError::workspace_io(&self.root, err))
    }

    pub fn live_path(&self, spec: &TaskSpec) -> PathBuf {
        self.root.join(&spec.filename)
    }

    pub fn snapshot_path(&self, spec: &TaskSpec, tag: SnapshotTag) -> PathBuf {
        self.root.join(spec.snapshot_filename(tag))
    }

    pub fn test_path(&self, spec: &TaskSpec) -> PathBuf {
        self.root.join(spec.test_filename())
    }

    /// Paths for the report, absolute when the root can be resolved.
    pub fn artifact_paths(&self, spec: &TaskSpec) -> ArtifactPaths {
        let absolute = |path: PathBuf| std::path::absolute(&path).unwrap_or(path);
        ArtifactPaths {
            live: absolute(self.live_path(spec)),
            buggy: absolute(self.snapshot_path(spec, SnapshotTag::Buggy)),
            fixed: absolute(self.snapshot_path(spec, SnapshotTag::Fixed)),
            tests: absolute(self.test_path(spec)),
        }
    }

    pub fn write(&self, path: &Path, content: &str) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| PipelineError::workspace_io(parent, err))?;
        }
        fs::write(path, content).map_err(|err| PipelineError::workspace_io(path, err))
    }

    pub fn read(&self, path: &Path) -> Result<String, PipelineError> {
        fs::read_to_string(path).map_err(|err| PipelineError::workspace_io(path, err))
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch-scoped filesystem state: a private scratch directory for
// intermediate files and the directory the finished document goes to.

use std::path::{Path, PathBuf};

use bindewerk_core::ConvertConfig;
use bindewerk_core::error::Result;
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

/// Directories owned by one batch.
///
/// The scratch directory is deleted by [`BatchWorkspace::close`], or when the
/// workspace is dropped on any other path. The output directory is never
/// cleaned up.
#[derive(Debug)]
pub struct BatchWorkspace {
    scratch: TempDir,
    output_dir: PathBuf,
}

impl BatchWorkspace {
    /// Create a fresh scratch directory under `scratch_root`.
    ///
    /// `output_dir` is only recorded here; the pipeline creates it when the
    /// document is written.
    pub fn create(scratch_root: &Path, output_dir: impl Into<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("bindewerk-")
            .tempdir_in(scratch_root)?;
        debug!(scratch = %scratch.path().display(), "Batch workspace created");
        Ok(Self {
            scratch,
            output_dir: output_dir.into(),
        })
    }

    /// Workspace under the configured scratch root.
    pub fn for_config(config: &ConvertConfig, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::create(&config.scratch_root(), output_dir)
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// A fresh `<uuid>.pdf` path in the output directory.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.pdf", Uuid::new_v4().simple()))
    }

    /// Delete the scratch directory and everything in it.
    pub fn close(self) {
        let path = self.scratch.path().to_path_buf();
        match self.scratch.close() {
            Ok(()) => debug!(scratch = %path.display(), "Scratch directory removed"),
            Err(err) => warn!(scratch = %path.display(), %err, "Failed to remove scratch directory"),
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bindewerk.

use thiserror::Error;

/// Top-level error type for all Bindewerk operations.
///
/// Only batch-level failures reach the caller as errors. Item-level problems
/// are downgraded to [`crate::Warning`]s by the pipeline.
#[derive(Debug, Error)]
pub enum BindewerkError {
    // -- Batch errors --
    #[error("no files supplied for conversion")]
    EmptyBatch,

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("document parsing failed: {0}")]
    DocumentError(String),

    // -- External tooling --
    #[error("external process failed: {0}")]
    Process(String),

    #[error("{program} did not finish within {secs}s")]
    ProcessTimeout { program: String, secs: u64 },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BindewerkError>;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bindewerk conversion pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BindewerkError;

/// Semantic kind of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Image,
    Audio,
    Video,
    /// Word-processor document (DOCX).
    Document,
    Pdf,
    Unknown,
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 7] = [
        Self::Text,
        Self::Image,
        Self::Audio,
        Self::Video,
        Self::Document,
        Self::Pdf,
        Self::Unknown,
    ];

    /// Map a bare extension (without the dot) to a category.
    ///
    /// Matching is case-insensitive. Unrecognised extensions map to
    /// [`Category::Unknown`].
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Self::Text,
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" => Self::Image,
            "mp3" | "wav" | "m4a" | "flac" | "aac" | "ogg" => Self::Audio,
            "mp4" | "mov" | "mkv" | "webm" | "avi" => Self::Video,
            "docx" => Self::Document,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    /// Classify a filename by the text after its last `.`.
    ///
    /// Advisory only: the file content is never inspected, so this is not a
    /// security boundary.
    pub fn classify(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Lowercase label used on the cover page and in item headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Pdf => "pdf",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One uploaded file being processed.
///
/// The category is fixed at construction and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionItem {
    /// Original filename as supplied by the caller. Untrusted; display only.
    pub title: String,
    /// Location of the saved source bytes.
    pub source_path: PathBuf,
    category: Category,
}

impl ConversionItem {
    /// Create an item, classifying it from `title`.
    pub fn new(title: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        let title = title.into();
        let category = Category::classify(&title);
        Self {
            title,
            source_path: source_path.into(),
            category,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

/// Container metadata recorded for audio and video items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Duration in seconds, rounded to one decimal place.
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub size_bytes: u64,
}

impl MediaMetadata {
    /// Round a raw duration to one decimal second.
    pub fn round_duration(raw_secs: f64) -> f64 {
        (raw_secs * 10.0).round() / 10.0
    }

    /// Render as a compact single-line JSON object.
    pub fn to_json_line(&self) -> String {
        // Serialising a struct of plain numbers cannot fail.
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!("{{\"size_bytes\":{}}}", self.size_bytes))
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in PDF points (width, height), portrait.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::A3 => (841.89, 1190.55),
            Self::A5 => (419.53, 595.28),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::Tabloid => (792.0, 1224.0),
            Self::Custom {
                width_mm,
                height_mm,
            } => (mm_to_pt(*width_mm as f32), mm_to_pt(*height_mm as f32)),
        }
    }
}

impl FromStr for PaperSize {
    type Err = BindewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            other => Err(BindewerkError::Config(format!("unknown paper size '{other}'"))),
        }
    }
}

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Convert PDF points to millimetres.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// What went wrong for a degraded item (or for the merge stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    TextUnreadable,
    ImageUndecodable,
    MetadataUnavailable,
    DocumentUnreadable,
    FrameUnavailable,
    /// Tooling an extractor needs was not detected at startup.
    CapabilityUnavailable,
    /// The extraction task itself crashed.
    ExtractionAborted,
    MergeFailed,
}

/// A recoverable problem recorded during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Zero-based submission index; `None` for batch-level warnings.
    pub item: Option<usize>,
    pub title: Option<String>,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn for_item(
        index: usize,
        item: &ConversionItem,
        kind: WarningKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            item: Some(index),
            title: Some(item.title.clone()),
            kind,
            message: message.into(),
        }
    }

    pub fn batch(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            item: None,
            title: None,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{title}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Final outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyStatus {
    Succeeded,
    Failed { reason: String },
}

/// Everything handed back to the caller once a batch finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyResult {
    #[serde(flatten)]
    pub status: AssemblyStatus,
    /// Path of the finished document. Present only on success.
    pub document_path: Option<PathBuf>,
    /// Item-level and merge-level warnings, in the order they were recorded.
    pub warnings: Vec<Warning>,
    /// Pages in the final document (after merging).
    pub page_count: usize,
    /// Number of source PDFs appended by the merge stage.
    pub merged_pdfs: usize,
}

impl AssemblyResult {
    pub fn succeeded(
        document_path: PathBuf,
        page_count: usize,
        merged_pdfs: usize,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            status: AssemblyStatus::Succeeded,
            document_path: Some(document_path),
            warnings,
            page_count,
            merged_pdfs,
        }
    }

    pub fn failed(reason: impl Into<String>, warnings: Vec<Warning>) -> Self {
        Self {
            status: AssemblyStatus::Failed {
                reason: reason.into(),
            },
            document_path: None,
            warnings,
            page_count: 0,
            merged_pdfs: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, AssemblyStatus::Succeeded)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content extractors — pull renderable content or metadata out of each
// item's source file.
//
// Extractors never fail the batch. Every problem becomes a `Warning` and the
// item's content degrades to a marker or to `Content::Absent`.

pub mod capability;
pub mod document;
pub mod image;
pub mod media;
pub mod process;
pub mod text;
pub mod video;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bindewerk_core::{Category, ConversionItem, ConvertConfig, MediaMetadata, Warning, WarningKind};
use tracing::warn;

use crate::image::DecodedImage;

pub use capability::{Capabilities, Capability};
pub use document::DocumentExtractor;
pub use self::image::ImageExtractor;
pub use media::AudioExtractor;
pub use process::{ProcessOutput, run_bounded};
pub use text::TextExtractor;
pub use video::VideoExtractor;

/// What happened when a video frame was requested.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// The category has no frame (audio).
    NotApplicable,
    Captured { path: PathBuf, image: DecodedImage },
    /// The decoder wrote a frame file that could not be decoded.
    Undecodable { path: PathBuf },
    /// A frame was attempted and none was produced.
    Failed,
}

/// Category-specific payload handed to the renderer.
#[derive(Debug, Clone)]
pub enum Content {
    /// Decoded text, or the unreadable-text marker.
    Text(String),
    Bitmap(DecodedImage),
    Media {
        metadata: Option<MediaMetadata>,
        frame: FrameOutcome,
    },
    /// Extraction was attempted and failed, or was skipped.
    Absent,
    /// The category has no extractor (`pdf`, `unknown`).
    None,
}

/// An extractor's result: content plus any warnings recorded on the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub content: Content,
    pub warnings: Vec<Warning>,
}

impl Extraction {
    pub fn ok(content: Content) -> Self {
        Self {
            content,
            warnings: Vec::new(),
        }
    }

    pub fn degraded(content: Content, warning: Warning) -> Self {
        Self {
            content,
            warnings: vec![warning],
        }
    }
}

/// Batch-scoped state shared by every extraction.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub config: Arc<ConvertConfig>,
    pub capabilities: Capabilities,
    /// Directory for intermediate files (captured frames). Removed with the
    /// batch workspace.
    pub scratch_dir: PathBuf,
}

/// One per-category extraction strategy.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Capabilities without which this extractor cannot run at all.
    fn requires(&self) -> &'static [Capability] {
        &[]
    }

    /// Content substituted when a required capability is missing.
    fn unavailable(&self) -> Content {
        Content::Absent
    }

    async fn extract(&self, index: usize, item: &ConversionItem, ctx: &ExtractContext) -> Extraction;
}

/// Maps every category to its extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorSet {
    text: TextExtractor,
    image: ImageExtractor,
    audio: AudioExtractor,
    video: VideoExtractor,
    document: DocumentExtractor,
}

impl ExtractorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The extractor for `category`, if that category has one.
    pub fn for_category(&self, category: Category) -> Option<&dyn Extractor> {
        match category {
            Category::Text => Some(&self.text),
            Category::Image => Some(&self.image),
            Category::Audio => Some(&self.audio),
            Category::Video => Some(&self.video),
            Category::Document => Some(&self.document),
            Category::Pdf | Category::Unknown => None,
        }
    }

    /// Run the extractor for `item`'s category, honouring capability gates.
    pub async fn extract(&self, index: usize, item: &ConversionItem, ctx: &ExtractContext) -> Extraction {
        let Some(extractor) = self.for_category(item.category()) else {
            return Extraction::ok(Content::None);
        };

        if let Some(missing) = ctx.capabilities.first_missing(extractor.requires()) {
            warn!(title = %item.title, extractor = extractor.name(), %missing, "Capability unavailable");
            return Extraction::degraded(
                extractor.unavailable(),
                Warning::for_item(
                    index,
                    item,
                    WarningKind::CapabilityUnavailable,
                    format!("{missing} unavailable, {} extraction skipped", extractor.name()),
                ),
            );
        }

        extractor.extract(index, item, ctx).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Context with the given capabilities, scratch space under `dir`.
    pub fn context(dir: &std::path::Path, capabilities: Capabilities) -> ExtractContext {
        ExtractContext {
            config: Arc::new(ConvertConfig::default()),
            capabilities,
            scratch_dir: dir.to_path_buf(),
        }
    }
}

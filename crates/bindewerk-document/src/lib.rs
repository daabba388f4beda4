// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bindewerk-document — Turning a batch of mixed uploads into one PDF.
//
// Provides per-category content extraction (text, images, audio/video
// metadata, video frames, DOCX paragraphs), a Helvetica-metric text layout
// engine, the page renderer and document assembler built on `printpdf`, the
// `lopdf` merge stage, and the batch pipeline tying them together.

pub mod assemble;
pub mod extract;
pub mod image;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod workspace;

// Re-export the primary structs so callers can use `bindewerk_document::ConversionPipeline` etc.
pub use assemble::{DocumentAssembler, PreparedItem};
pub use extract::{Capabilities, Capability, Content, ExtractorSet, FrameOutcome};
pub use crate::image::DecodedImage;
pub use layout::{LayoutCursor, TextLayout, wrap_text};
pub use pdf::{Canvas, MergeOutcome, SealedDocument, merge_sources};
pub use pipeline::{ConversionPipeline, SourceFile};
pub use render::PageRenderer;
pub use workspace::BatchWorkspace;

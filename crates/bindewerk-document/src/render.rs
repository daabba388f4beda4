// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page renderer — draws one item's page group.
//
// Every item gets the same two-line header followed by a category-specific
// body, and every page group ends with a page break. Content that could not
// be extracted is replaced by a fixed marker line.

use bindewerk_core::{Category, ConversionItem, ConvertConfig, MediaMetadata};
use tracing::debug;

use crate::extract::{Content, FrameOutcome};
use crate::image::{DecodedImage, fit_within};
use crate::layout::{LayoutCursor, TextLayout};
use crate::pdf::{Canvas, Font};

pub const TEXT_UNREADABLE: &str = "(failed to read text file)";
pub const IMAGE_UNRENDERABLE: &str = "(failed to render image)";
pub const NO_FRAME: &str = "(no frame extracted — ffmpeg missing or failed)";
pub const FRAME_UNRENDERABLE: &str = "(failed to render video frame)";
pub const DOCUMENT_UNREADABLE: &str = "(failed to extract docx text)";
pub const PDF_PENDING_MERGE: &str = "This PDF will be merged into the final document.";
pub const UNKNOWN_TYPE: &str = "(unknown file type — file included as metadata)";
pub const AUDIO_DISCLAIMER: &str = "Note: audio is not embedded — only metadata/name shown.";

/// Left edge of everything drawn on an item page.
pub(crate) const MARGIN_X: f32 = 50.0;
/// Top and bottom margin for body text.
const BODY_MARGIN: f32 = 50.0;
const TITLE_OFFSET: f32 = 50.0;
const TYPE_OFFSET: f32 = 66.0;
const BODY_OFFSET: f32 = 90.0;
/// Space kept clear around a bitmap: 100pt horizontally, 140pt vertically.
const IMAGE_RESERVED_W: f32 = 100.0;
const IMAGE_RESERVED_H: f32 = 140.0;
const FRAME_GAP: f32 = 20.0;
const AUDIO_LINE_STEP: f32 = 16.0;

/// Draws item page groups onto a canvas.
pub struct PageRenderer<'a> {
    config: &'a ConvertConfig,
}

impl<'a> PageRenderer<'a> {
    pub fn new(config: &'a ConvertConfig) -> Self {
        Self { config }
    }

    /// Render `item` starting on a fresh page and finish with a page break.
    pub fn render(&self, canvas: &mut Canvas, item: &ConversionItem, content: &Content) {
        let (_, page_h) = canvas.page_size();
        let pages_before = canvas.page_count();

        canvas.draw_text(
            MARGIN_X,
            page_h - TITLE_OFFSET,
            Font::HelveticaBold,
            12.0,
            format!("File: {}", item.title),
        );
        canvas.draw_text(
            MARGIN_X,
            page_h - TYPE_OFFSET,
            Font::Helvetica,
            10.0,
            format!("Type: {}", item.category()),
        );

        let mut cursor = LayoutCursor::on(
            canvas,
            MARGIN_X,
            page_h - BODY_OFFSET,
            self.config.body_line_height,
            BODY_MARGIN,
        );

        match item.category() {
            Category::Text => {
                let text = match content {
                    Content::Text(text) => text.as_str(),
                    _ => TEXT_UNREADABLE,
                };
                self.draw_body(canvas, &mut cursor, text);
            }
            Category::Image => {
                let drawn = match content {
                    Content::Bitmap(image) => self.draw_centered(canvas, &cursor, image),
                    _ => false,
                };
                if !drawn {
                    self.draw_line(canvas, &cursor, IMAGE_UNRENDERABLE);
                }
            }
            Category::Video => self.render_video(canvas, &mut cursor, content),
            Category::Audio => self.render_audio(canvas, &mut cursor, item, content),
            Category::Document => match content {
                Content::Text(text) => self.draw_body(canvas, &mut cursor, text),
                _ => self.draw_line(canvas, &cursor, DOCUMENT_UNREADABLE),
            },
            Category::Pdf => self.draw_line(canvas, &cursor, PDF_PENDING_MERGE),
            Category::Unknown => self.draw_line(canvas, &cursor, UNKNOWN_TYPE),
        }

        canvas.page_break();
        debug!(
            title = %item.title,
            category = %item.category(),
            pages = canvas.page_count() - pages_before,
            "Item rendered"
        );
    }

    fn render_video(&self, canvas: &mut Canvas, cursor: &mut LayoutCursor, content: &Content) {
        let (metadata, frame) = match content {
            Content::Media { metadata, frame } => (metadata.as_ref(), frame),
            _ => (None, &FrameOutcome::Failed),
        };

        match frame {
            FrameOutcome::Captured { image, .. } => {
                match self.fit_to_page(canvas, image) {
                    Some((width, height)) => {
                        canvas.draw_image(image, MARGIN_X, cursor.y - height, width, height);
                        cursor.y -= height + FRAME_GAP;
                    }
                    None => {
                        self.draw_line(canvas, cursor, FRAME_UNRENDERABLE);
                        cursor.y -= FRAME_GAP;
                    }
                }
            }
            FrameOutcome::Undecodable { .. } => {
                self.draw_line(canvas, cursor, FRAME_UNRENDERABLE);
                cursor.y -= FRAME_GAP;
            }
            FrameOutcome::Failed | FrameOutcome::NotApplicable => {
                self.draw_line(canvas, cursor, NO_FRAME);
                cursor.y -= FRAME_GAP;
            }
        }

        if let Some(metadata) = metadata {
            self.draw_line(canvas, cursor, &metadata_line(metadata));
        }
    }

    fn render_audio(
        &self,
        canvas: &mut Canvas,
        cursor: &mut LayoutCursor,
        item: &ConversionItem,
        content: &Content,
    ) {
        self.draw_line(canvas, cursor, &format!("Filename: {}", item.title));
        cursor.y -= AUDIO_LINE_STEP;

        if let Content::Media {
            metadata: Some(metadata),
            ..
        } = content
        {
            self.draw_line(canvas, cursor, &metadata_line(metadata));
            cursor.y -= AUDIO_LINE_STEP;
        }

        self.draw_line(canvas, cursor, AUDIO_DISCLAIMER);
    }

    fn draw_body(&self, canvas: &mut Canvas, cursor: &mut LayoutCursor, text: &str) {
        let (page_w, _) = canvas.page_size();
        TextLayout::new(Font::Helvetica, self.config.body_font_size).draw(
            canvas,
            cursor,
            text,
            page_w - 2.0 * MARGIN_X,
        );
    }

    fn draw_line(&self, canvas: &mut Canvas, cursor: &LayoutCursor, text: &str) {
        canvas.draw_text(cursor.x, cursor.y, Font::Helvetica, self.config.body_font_size, text);
    }

    /// Centre `image` horizontally with its top edge at the cursor.
    ///
    /// Returns `false` when the image has no drawable size.
    fn draw_centered(&self, canvas: &mut Canvas, cursor: &LayoutCursor, image: &DecodedImage) -> bool {
        let Some((width, height)) = self.fit_to_page(canvas, image) else {
            return false;
        };
        let (page_w, _) = canvas.page_size();
        canvas.draw_image(image, (page_w - width) / 2.0, cursor.y - height, width, height);
        true
    }

    fn fit_to_page(&self, canvas: &Canvas, image: &DecodedImage) -> Option<(f32, f32)> {
        let (page_w, page_h) = canvas.page_size();
        fit_within(
            image.width(),
            image.height(),
            page_w - IMAGE_RESERVED_W,
            page_h - IMAGE_RESERVED_H,
        )
        .map(|size| (size.width, size.height))
    }
}

fn metadata_line(metadata: &MediaMetadata) -> String {
    format!("Metadata: {}", metadata.to_json_line())
}

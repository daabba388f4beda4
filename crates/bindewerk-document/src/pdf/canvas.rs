// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF canvas — an in-memory page model that is serialised with `printpdf` 0.8
// when the document is sealed.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. The canvas keeps its own draw list so the layout can
// be inspected before anything is written.

use std::path::{Path, PathBuf};

use bindewerk_core::PaperSize;
use bindewerk_core::error::{BindewerkError, Result};
use bindewerk_core::types::pt_to_mm;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage, RawImageData,
    RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::metrics::Font;
use crate::image::DecodedImage;

/// Native resolution at which one image pixel maps to one PDF point.
const POINTS_DPI: f32 = 72.0;

/// A single drawing instruction, in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        text: String,
    },
    /// Place image `index` with its bottom-left corner at (`x`, `y`).
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// One output page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    ops: Vec<DrawOp>,
}

impl Page {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Every text run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    /// `(x, y, width, height)` of every image placed on the page.
    pub fn images(&self) -> impl Iterator<Item = (f32, f32, f32, f32)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image {
                x,
                y,
                width,
                height,
                ..
            } => Some((*x, *y, *width, *height)),
            DrawOp::Text { .. } => None,
        })
    }
}

/// A document sealed to disk.
#[derive(Debug, Clone)]
pub struct SealedDocument {
    pub path: PathBuf,
    pub page_count: usize,
}

/// Accumulates pages for one output document.
///
/// Exclusively owned by the assembler for the duration of a batch. Sealing
/// consumes the canvas, so nothing can be drawn after the document is
/// written.
pub struct Canvas {
    paper_size: PaperSize,
    title: String,
    pages: Vec<Page>,
    current: Page,
    images: Vec<RawImage>,
}

impl Canvas {
    /// Create an empty canvas targeting the given paper size.
    pub fn new(paper_size: PaperSize, title: impl Into<String>) -> Self {
        Self {
            paper_size,
            title: title.into(),
            pages: Vec::new(),
            current: Page::default(),
            images: Vec::new(),
        }
    }

    /// Page dimensions in points.
    pub fn page_size(&self) -> (f32, f32) {
        self.paper_size.dimensions_pt()
    }

    /// Draw one line of text with its baseline at `y`.
    pub fn draw_text(&mut self, x: f32, y: f32, font: Font, size: f32, text: impl Into<String>) {
        self.current.ops.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            text: text.into(),
        });
    }

    /// Draw `image` scaled to `width` x `height` points with its bottom-left
    /// corner at (`x`, `y`).
    pub fn draw_image(&mut self, image: &DecodedImage, x: f32, y: f32, width: f32, height: f32) {
        let rgb = image.to_rgb8();
        let (px_w, px_h) = (rgb.width() as usize, rgb.height() as usize);
        self.images.push(RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: px_w,
            height: px_h,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        });
        self.current.ops.push(DrawOp::Image {
            index: self.images.len() - 1,
            x,
            y,
            width,
            height,
        });
    }

    /// Finish the current page.
    ///
    /// A break on a page with nothing drawn is a no-op, so consecutive breaks
    /// never produce blank pages.
    pub fn page_break(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
    }

    /// Number of pages the document would have if sealed now.
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(!self.current.is_empty())
    }

    /// All pages drawn so far, including the unfinished current page.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages
            .iter()
            .chain(std::iter::once(&self.current).filter(|page| !page.is_empty()))
    }

    /// Serialise the canvas into PDF bytes.
    ///
    /// Returns the bytes together with the number of pages written. An empty
    /// canvas produces a single blank page.
    #[instrument(skip(self), fields(title = %self.title))]
    pub fn into_pdf_bytes(mut self) -> (Vec<u8>, usize) {
        self.page_break();
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }

        let (w_pt, h_pt) = self.page_size();
        let (page_w, page_h) = (Mm(pt_to_mm(w_pt)), Mm(pt_to_mm(h_pt)));

        let mut doc = PdfDocument::new(&self.title);
        let image_sizes: Vec<(f32, f32)> = self
            .images
            .iter()
            .map(|raw| (raw.width as f32, raw.height as f32))
            .collect();
        let xobject_ids: Vec<_> = self.images.iter().map(|raw| doc.add_image(raw)).collect();

        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let mut ops: Vec<Op> = Vec::with_capacity(page.ops.len() * 5);
            for op in &page.ops {
                match op {
                    DrawOp::Text {
                        x,
                        y,
                        font,
                        size,
                        text,
                    } => {
                        ops.push(Op::StartTextSection);
                        ops.push(Op::SetTextCursor {
                            pos: Point { x: Pt(*x), y: Pt(*y) },
                        });
                        ops.push(Op::SetFontSizeBuiltinFont {
                            size: Pt(*size),
                            font: font.builtin(),
                        });
                        ops.push(Op::WriteTextBuiltinFont {
                            items: vec![TextItem::Text(encodable_text(text))],
                            font: font.builtin(),
                        });
                        ops.push(Op::EndTextSection);
                    }
                    DrawOp::Image {
                        index,
                        x,
                        y,
                        width,
                        height,
                    } => {
                        let (px_w, px_h) = image_sizes[*index];
                        ops.push(Op::UseXobject {
                            id: xobject_ids[*index].clone(),
                            transform: XObjectTransform {
                                translate_x: Some(Pt(*x)),
                                translate_y: Some(Pt(*y)),
                                scale_x: Some(width / px_w),
                                scale_y: Some(height / px_h),
                                dpi: Some(POINTS_DPI),
                                rotate: None,
                            },
                        });
                    }
                }
            }
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        let page_count = pdf_pages.len();
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported serialisation warnings");
        }

        debug!(page_count, bytes = output.len(), "Canvas serialised");
        (output, page_count)
    }

    /// Serialise the canvas and write it to `path`.
    ///
    /// The bytes go to a side file first and are renamed into place, so
    /// `path` either holds the complete document or does not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn seal(self, path: impl AsRef<Path>) -> Result<SealedDocument> {
        let path = path.as_ref();
        let (bytes, page_count) = self.into_pdf_bytes();

        super::write_via_side_file(path, "partial", &bytes).map_err(|err| {
            warn!(%err, "Sealing failed");
            BindewerkError::PdfError(format!("failed to write {}: {}", path.display(), err))
        })?;

        info!(page_count, "Document sealed");
        Ok(SealedDocument {
            path: path.to_path_buf(),
            page_count,
        })
    }
}

/// Restrict text to what the base-14 fonts can show.
///
/// Tabs become spaces, other control characters are dropped, and characters
/// outside Latin-1 (bar a few common typographic marks) become `?`.
fn encodable_text(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c if (c as u32) <= 0xFF => Some(c),
            '—' | '–' | '‘' | '’' | '“' | '”' | '•' | '…' | '€' => Some(ch),
            _ => Some('?'),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image(w: u32, h: u32) -> DecodedImage {
        DecodedImage::from_dynamic(::image::DynamicImage::new_rgb8(w, h))
    }

    #[test]
    fn page_break_on_empty_page_is_noop() {
        let mut canvas = Canvas::new(PaperSize::A4, "t");
        canvas.page_break();
        canvas.page_break();
        assert_eq!(canvas.page_count(), 0);

        canvas.draw_text(50.0, 700.0, Font::Helvetica, 10.0, "hello");
        canvas.page_break();
        canvas.page_break();
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn pages_include_unfinished_current_page() {
        let mut canvas = Canvas::new(PaperSize::A4, "t");
        canvas.draw_text(50.0, 700.0, Font::Helvetica, 10.0, "one");
        canvas.page_break();
        canvas.draw_text(50.0, 700.0, Font::Helvetica, 10.0, "two");

        let texts: Vec<Vec<&str>> = canvas.pages().map(|p| p.texts().collect()).collect();
        assert_eq!(texts, vec![vec!["one"], vec!["two"]]);
    }

    #[test]
    fn image_placement_is_recorded() {
        let mut canvas = Canvas::new(PaperSize::A4, "t");
        canvas.draw_image(&sample_image(20, 10), 5.0, 6.0, 40.0, 20.0);
        let placed: Vec<_> = canvas.pages().flat_map(|p| p.images()).collect();
        assert_eq!(placed, vec![(5.0, 6.0, 40.0, 20.0)]);
    }

    #[test]
    fn empty_canvas_serialises_one_blank_page() {
        let canvas = Canvas::new(PaperSize::A4, "blank");
        let (bytes, pages) = canvas.into_pdf_bytes();
        assert_eq!(pages, 1);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn sealed_document_is_readable_by_lopdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");

        let mut canvas = Canvas::new(PaperSize::Letter, "sealed");
        canvas.draw_text(50.0, 700.0, Font::HelveticaBold, 12.0, "first");
        canvas.page_break();
        canvas.draw_image(&sample_image(8, 8), 50.0, 50.0, 8.0, 8.0);

        let sealed = canvas.seal(&path).expect("seal");
        assert_eq!(sealed.page_count, 2);
        assert!(!dir.path().join("out.pdf.partial").exists());

        let doc = lopdf::Document::load(&path).expect("load sealed");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn sealing_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.pdf");
        let mut canvas = Canvas::new(PaperSize::A4, "t");
        canvas.draw_text(1.0, 1.0, Font::Helvetica, 10.0, "x");

        assert!(matches!(canvas.seal(&path), Err(BindewerkError::PdfError(_))));
        assert!(!path.exists());
    }

    #[test]
    fn encodable_text_replaces_unsupported_characters() {
        assert_eq!(encodable_text("a\tb"), "a b");
        assert_eq!(encodable_text("caf\u{e9} \u{2014} ok"), "caf\u{e9} \u{2014} ok");
        assert_eq!(encodable_text("bad \u{fffd} \u{4e2d}"), "bad ? ?");
        assert_eq!(encodable_text("bell\u{7}"), "bell");
    }
}

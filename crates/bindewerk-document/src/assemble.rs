// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — cover page, then one page group per item in
// submission order, then sealing.

use std::path::Path;
use std::sync::Arc;

use bindewerk_core::error::Result;
use bindewerk_core::{ConversionItem, ConvertConfig};
use tracing::{info, instrument};

use crate::extract::Content;
use crate::layout::LayoutCursor;
use crate::pdf::{Canvas, Font, SealedDocument};
use crate::render::{MARGIN_X, PageRenderer};

const COVER_HEADING_OFFSET: f32 = 70.0;
const COVER_LIST_OFFSET: f32 = 100.0;
const COVER_LINE_HEIGHT: f32 = 14.0;
const COVER_MARGIN: f32 = 60.0;

/// An item together with its extracted content, ready to render.
#[derive(Debug, Clone)]
pub struct PreparedItem {
    pub item: ConversionItem,
    pub content: Content,
}

/// Builds the primary document for one batch.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    config: Arc<ConvertConfig>,
}

impl DocumentAssembler {
    pub fn new(config: Arc<ConvertConfig>) -> Self {
        Self { config }
    }

    /// Lay out the cover page and every item without writing anything.
    pub fn compose(&self, items: &[PreparedItem]) -> Canvas {
        let mut canvas = Canvas::new(self.config.paper_size, self.config.cover_title.as_str());
        self.draw_cover(&mut canvas, items);
        canvas.page_break();

        let renderer = PageRenderer::new(&self.config);
        for prepared in items {
            renderer.render(&mut canvas, &prepared.item, &prepared.content);
        }
        canvas
    }

    /// Compose and seal the document at `path`.
    #[instrument(skip_all, fields(items = items.len(), path = %path.display()))]
    pub fn assemble(&self, items: &[PreparedItem], path: &Path) -> Result<SealedDocument> {
        let canvas = self.compose(items);
        info!(pages = canvas.page_count(), "Document composed");
        canvas.seal(path)
    }

    fn draw_cover(&self, canvas: &mut Canvas, items: &[PreparedItem]) {
        let (_, page_h) = canvas.page_size();
        canvas.draw_text(
            MARGIN_X,
            page_h - COVER_HEADING_OFFSET,
            Font::HelveticaBold,
            18.0,
            self.config.cover_title.as_str(),
        );

        let mut cursor = LayoutCursor::on(
            canvas,
            MARGIN_X,
            page_h - COVER_LIST_OFFSET,
            COVER_LINE_HEIGHT,
            COVER_MARGIN,
        );
        for prepared in items {
            canvas.draw_text(
                cursor.x,
                cursor.y,
                Font::Helvetica,
                10.0,
                format!("{} — {}", prepared.item.title, prepared.item.category()),
            );
            cursor.advance(canvas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindewerk_core::PaperSize;
    use std::path::PathBuf;

    fn prepared(name: &str, content: Content) -> PreparedItem {
        PreparedItem {
            item: ConversionItem::new(name, PathBuf::from("/unused")),
            content,
        }
    }

    fn assembler() -> DocumentAssembler {
        DocumentAssembler::new(Arc::new(ConvertConfig::default()))
    }

    #[test]
    fn cover_lists_every_item_in_order() {
        let items = vec![
            prepared("b.txt", Content::Text("two".into())),
            prepared("a.pdf", Content::None),
        ];
        let canvas = assembler().compose(&items);
        let cover: Vec<&str> = canvas.pages().next().expect("cover").texts().collect();
        assert_eq!(cover, vec!["Converted Files", "b.txt — text", "a.pdf — pdf"]);
        assert_eq!(canvas.page_count(), 3);
    }

    #[test]
    fn item_pages_follow_submission_order() {
        let items = vec![
            prepared("z.txt", Content::Text("last alphabetically".into())),
            prepared("a.xyz", Content::None),
        ];
        let canvas = assembler().compose(&items);
        let firsts: Vec<&str> = canvas.pages().skip(1).filter_map(|p| p.texts().next()).collect();
        assert_eq!(firsts, vec!["File: z.txt", "File: a.xyz"]);
    }

    #[test]
    fn long_cover_is_paginated() {
        let items: Vec<PreparedItem> = (0..120)
            .map(|n| prepared(&format!("file{n}.bin"), Content::None))
            .collect();
        let canvas = assembler().compose(&items);
        let cover_pages = canvas.page_count() - items.len();
        assert!(cover_pages >= 2, "expected multi-page cover, got {cover_pages}");
        let first_cover: Vec<&str> = canvas.pages().next().expect("cover").texts().collect();
        // Heading plus the lines that fit between y = h - 100 and y = 60.
        let (_, h) = PaperSize::A4.dimensions_pt();
        let fit = ((h - 100.0 - 60.0) / 14.0).floor() as usize + 1;
        assert_eq!(first_cover.len(), 1 + fit);
    }

    #[test]
    fn custom_cover_title_is_used() {
        let config = ConvertConfig {
            cover_title: "Exhibit bundle".into(),
            ..ConvertConfig::default()
        };
        let canvas = DocumentAssembler::new(Arc::new(config)).compose(&[]);
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.pages().next().and_then(|p| p.texts().next()), Some("Exhibit bundle"));
    }

    #[test]
    fn assemble_seals_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");
        let items = vec![prepared("n.txt", Content::Text("hi".into()))];

        let sealed = assembler().assemble(&items, &path).expect("assemble");
        assert_eq!(sealed.page_count, 2);
        assert_eq!(lopdf::Document::load(&path).expect("load").get_pages().len(), 2);
    }
}

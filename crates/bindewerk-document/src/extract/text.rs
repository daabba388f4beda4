// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text extraction.

use async_trait::async_trait;
use bindewerk_core::{ConversionItem, Warning, WarningKind};
use tracing::{debug, warn};

use super::{Content, ExtractContext, Extraction, Extractor};
use crate::render::TEXT_UNREADABLE;

/// Reads the file as UTF-8, replacing undecodable bytes with U+FFFD and
/// dropping a leading byte-order mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn extract(&self, index: usize, item: &ConversionItem, _ctx: &ExtractContext) -> Extraction {
        match tokio::fs::read(item.source_path()).await {
            Ok(bytes) => {
                let decoded = String::from_utf8_lossy(&bytes);
                // A leading byte-order mark is not content.
                let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded).to_string();
                debug!(title = %item.title, chars = text.len(), "Text extracted");
                Extraction::ok(Content::Text(text))
            }
            Err(err) => {
                warn!(title = %item.title, %err, "Text file unreadable");
                Extraction::degraded(
                    Content::Text(TEXT_UNREADABLE.to_string()),
                    Warning::for_item(
                        index,
                        item,
                        WarningKind::TextUnreadable,
                        format!("failed to read text file: {err}"),
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Capabilities, test_support};

    #[tokio::test]
    async fn malformed_utf8_is_replaced_not_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"ok \xff\xfe done").expect("write");
        let ctx = test_support::context(dir.path(), Capabilities::with_tools(false, false));

        let extraction = TextExtractor
            .extract(0, &ConversionItem::new("notes.txt", &path), &ctx)
            .await;
        match extraction.content {
            Content::Text(text) => assert_eq!(text, "ok \u{fffd}\u{fffd} done"),
            other => panic!("unexpected content: {other:?}"),
        }
        assert!(extraction.warnings.is_empty());
    }

    #[tokio::test]
    async fn leading_byte_order_mark_is_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bom.txt");
        std::fs::write(&path, b"\xef\xbb\xbfFirst line\r\nsecond").expect("write");
        let ctx = test_support::context(dir.path(), Capabilities::with_tools(false, false));

        let extraction = TextExtractor
            .extract(0, &ConversionItem::new("bom.txt", &path), &ctx)
            .await;
        match extraction.content {
            Content::Text(text) => assert_eq!(text, "First line\r\nsecond"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_yields_marker_and_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = test_support::context(dir.path(), Capabilities::with_tools(false, false));
        let item = ConversionItem::new("gone.txt", dir.path().join("gone.txt"));

        let extraction = TextExtractor.extract(4, &item, &ctx).await;
        assert!(matches!(&extraction.content, Content::Text(t) if t == TEXT_UNREADABLE));
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].kind, WarningKind::TextUnreadable);
        assert_eq!(extraction.warnings[0].item, Some(4));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-processor (DOCX) paragraph text, read from `word/document.xml` inside
// the ZIP container. Requires the "docx" cargo feature.

use std::path::Path;

use async_trait::async_trait;
use bindewerk_core::error::{BindewerkError, Result};
use bindewerk_core::{ConversionItem, Warning, WarningKind};
use tracing::{debug, instrument, warn};

use super::{Capability, Content, ExtractContext, Extraction, Extractor};

/// Refuse to inflate a document body larger than this.
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
const MAX_DOCUMENT_XML: u64 = 64 * 1024 * 1024;

/// Extracts paragraph text, one paragraph per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

#[async_trait]
impl Extractor for DocumentExtractor {
    fn name(&self) -> &'static str {
        "document"
    }

    fn requires(&self) -> &'static [Capability] {
        &[Capability::DocumentText]
    }

    async fn extract(&self, index: usize, item: &ConversionItem, _ctx: &ExtractContext) -> Extraction {
        let path = item.source_path().to_path_buf();
        let text = tokio::task::spawn_blocking(move || read_docx_text(&path))
            .await
            .map_err(|err| BindewerkError::Task(err.to_string()))
            .and_then(|res| res);

        let reason = match text {
            Ok(text) if !text.trim().is_empty() => {
                debug!(title = %item.title, chars = text.len(), "Document text extracted");
                return Extraction::ok(Content::Text(text));
            }
            Ok(_) => "document contains no paragraph text".to_string(),
            Err(err) => err.to_string(),
        };

        warn!(title = %item.title, %reason, "Document text unavailable");
        Extraction::degraded(
            Content::Absent,
            Warning::for_item(index, item, WarningKind::DocumentUnreadable, reason),
        )
    }
}

/// Paragraph text of the DOCX at `path`, joined with `\n`.
#[cfg(feature = "docx")]
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_docx_text(path: &Path) -> Result<String> {
    use std::io::Read;

    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|err| BindewerkError::DocumentError(format!("not a DOCX container: {err}")))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|err| BindewerkError::DocumentError(format!("missing word/document.xml: {err}")))?;

    let mut xml = String::new();
    entry
        .take(MAX_DOCUMENT_XML)
        .read_to_string(&mut xml)
        .map_err(|err| BindewerkError::DocumentError(format!("unreadable document body: {err}")))?;

    Ok(paragraph_text(&xml))
}

#[cfg(not(feature = "docx"))]
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_docx_text(path: &Path) -> Result<String> {
    Err(BindewerkError::DocumentError(
        "DOCX support not compiled in (enable the \"docx\" feature)".into(),
    ))
}

/// Concatenate the text runs of every `w:p` in a WordprocessingML body.
///
/// `w:tab` becomes a tab and `w:br`/`w:cr` a newline. Paragraphs nested in
/// text boxes are emitted before the paragraph that anchors them.
pub(crate) fn paragraph_text(xml: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    // Open paragraphs, innermost last.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut in_tab_stops = false;

    let mut rest = xml;
    while let Some(lt) = rest.find('<') {
        if in_text {
            if let Some(current) = open.last_mut() {
                current.push_str(&unescape(&rest[..lt]));
            }
        }
        rest = &rest[lt..];

        // Comments and processing instructions carry no text.
        if rest.starts_with("<!--") {
            rest = rest.find("-->").map_or("", |end| &rest[end + 3..]);
            continue;
        }
        let Some(gt) = rest.find('>') else {
            break;
        };
        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];
        if tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();

        match (name, closing) {
            ("w:p", false) => {
                if self_closing {
                    paragraphs.push(String::new());
                } else {
                    open.push(String::new());
                }
            }
            ("w:p", true) => {
                if let Some(done) = open.pop() {
                    paragraphs.push(done);
                }
            }
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tabs", false) => in_tab_stops = !self_closing,
            ("w:tabs", true) => in_tab_stops = false,
            ("w:tab", false) if !in_tab_stops => push_char(&mut open, '\t'),
            ("w:br" | "w:cr", false) => push_char(&mut open, '\n'),
            _ => {}
        }
    }

    // Unterminated paragraphs in a truncated body still count.
    paragraphs.extend(open);
    paragraphs.join("\n")
}

fn push_char(open: &mut [String], ch: char) {
    if let Some(current) = open.last_mut() {
        current.push(ch);
    }
}

/// Resolve the predefined XML entities and numeric character references.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let resolved = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match resolved {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

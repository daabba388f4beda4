// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Greedy word wrap measured with Helvetica metrics.

use std::borrow::Cow;

use super::LayoutCursor;
use crate::pdf::{Canvas, Font, string_width};

/// Wrap `text` into lines no wider than `max_width` points.
///
/// Each input line is a paragraph, whether it ends in `\n`, `\r\n` or a
/// lone `\r`. A paragraph is trimmed, a blank paragraph becomes one empty
/// output line, and words are appended greedily while the line still fits.
/// A word that is wider than `max_width` on its own is kept whole on its own
/// line.
pub fn wrap_text(text: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let normalized: Cow<'_, str> = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    };

    let mut lines = Vec::new();
    for paragraph in normalized.lines() {
        let mut words = paragraph.split_whitespace();
        let Some(first) = words.next() else {
            lines.push(String::new());
            continue;
        };

        let mut current = first.to_string();
        for word in words {
            let candidate_width =
                string_width(&current, font, size) + string_width(" ", font, size) + string_width(word, font, size);
            if candidate_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

/// Draws wrapped body text at a fixed font and size.
#[derive(Debug, Clone, Copy)]
pub struct TextLayout {
    pub font: Font,
    pub size: f32,
}

impl TextLayout {
    pub fn new(font: Font, size: f32) -> Self {
        Self { font, size }
    }

    /// Wrap `text` and draw it line by line from the cursor, advancing (and
    /// breaking pages) after every line.
    ///
    /// Returns the number of lines drawn.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        cursor: &mut LayoutCursor,
        text: &str,
        max_width: f32,
    ) -> usize {
        let lines = wrap_text(text, max_width, self.font, self.size);
        for line in &lines {
            canvas.draw_text(cursor.x, cursor.y, self.font, self.size, line.as_str());
            cursor.advance(canvas);
        }
        lines.len()
    }
}

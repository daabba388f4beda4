// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page drawing state.

use crate::pdf::Canvas;

/// Transient drawing position on the current page, in points from the
/// bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub x: f32,
    pub y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub line_height: f32,
    /// Distance from the top edge where `y` restarts after a page break.
    pub top_margin: f32,
    /// `y` may not drop below this without a page break.
    pub bottom_margin: f32,
}

impl LayoutCursor {
    /// A cursor for `canvas`'s page size starting at (`x`, `y`).
    pub fn on(canvas: &Canvas, x: f32, y: f32, line_height: f32, margin: f32) -> Self {
        let (page_width, page_height) = canvas.page_size();
        Self {
            x,
            y,
            page_width,
            page_height,
            line_height,
            top_margin: margin,
            bottom_margin: margin,
        }
    }

    /// Move `y` back to the top margin.
    pub fn reset(&mut self) {
        self.y = self.page_height - self.top_margin;
    }

    /// Move down one line, breaking the page when the bottom margin is
    /// crossed.
    pub fn advance(&mut self, canvas: &mut Canvas) {
        self.advance_by(self.line_height, canvas);
    }

    /// Move down `dy` points, breaking the page when the bottom margin is
    /// crossed.
    pub fn advance_by(&mut self, dy: f32, canvas: &mut Canvas) {
        self.y -= dy;
        if self.y < self.bottom_margin {
            canvas.page_break();
            self.reset();
        }
    }
}

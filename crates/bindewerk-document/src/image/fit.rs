// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fitting a bitmap into the usable page area.

/// Display size of a bitmap on the page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledSize {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Scale `img_w` x `img_h` pixels (one pixel = one point) to fit inside
/// `max_w` x `max_h` points.
///
/// Images are only ever shrunk, never enlarged, and the aspect ratio is
/// preserved. Returns `None` for a zero-sized image.
pub fn fit_within(img_w: u32, img_h: u32, max_w: f32, max_h: f32) -> Option<ScaledSize> {
    if img_w == 0 || img_h == 0 {
        return None;
    }
    let (w, h) = (img_w as f32, img_h as f32);
    let scale = (max_w / w).min(max_h / h).min(1.0).max(0.0);
    Some(ScaledSize {
        width: w * scale,
        height: h * scale,
        scale,
    })
}

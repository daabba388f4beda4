// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph metrics for the PDF base-14 Helvetica faces.
//
// Widths are the AFM advance widths in 1/1000 em for the printable ASCII
// range. Anything outside that range is measured with the average lowercase
// advance, which is close enough for Latin-1 text.

use printpdf::BuiltinFont;

/// The two faces the renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    pub(crate) fn builtin(self) -> BuiltinFont {
        match self {
            Self::Helvetica => BuiltinFont::Helvetica,
            Self::HelveticaBold => BuiltinFont::HelveticaBold,
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA_WIDTHS,
            Self::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

const FALLBACK_WIDTH: u16 = 556;

// U+0020 ..= U+007E
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Advance width of a single character in 1/1000 em.
fn char_width(font: Font, ch: char) -> u16 {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        font.widths()[(code - 0x20) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Measured width of `text` in points when set in `font` at `size` points.
pub fn string_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(font, ch))).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_has_no_width() {
        assert_eq!(string_width("", Font::Helvetica, 10.0), 0.0);
    }

    #[test]
    fn known_helvetica_advances() {
        // "Hello" = 722 + 556 + 222 + 222 + 556 = 2278 units.
        let w = string_width("Hello", Font::Helvetica, 10.0);
        assert!((w - 22.78).abs() < 1e-3, "got {w}");
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let text = "Converted Files";
        assert!(
            string_width(text, Font::HelveticaBold, 12.0) > string_width(text, Font::Helvetica, 12.0)
        );
    }

    #[test]
    fn width_scales_linearly_with_size() {
        let small = string_width("scale me", Font::Helvetica, 10.0);
        let large = string_width("scale me", Font::Helvetica, 20.0);
        assert!((large - 2.0 * small).abs() < 1e-3);
    }

    #[test]
    fn non_ascii_uses_fallback_width() {
        let w = string_width("é", Font::Helvetica, 1000.0);
        assert_eq!(w, f32::from(FALLBACK_WIDTH));
    }
}

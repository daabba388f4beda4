// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — bitmap decoding and fitting bitmaps onto a page.

pub mod decode;
pub mod fit;

pub use decode::DecodedImage;
pub use fit::{ScaledSize, fit_within};

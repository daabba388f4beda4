// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text layout engine — the vertical drawing cursor and greedy word wrap.
//
// The engine knows nothing about item categories; it only measures, wraps,
// and draws lines while keeping the cursor above the bottom margin.

pub mod cursor;
pub mod wrap;

pub use cursor::LayoutCursor;
pub use wrap::{TextLayout, wrap_text};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page model and sealing, glyph metrics, and appending source
// PDFs onto a sealed document.

pub mod canvas;
pub mod merge;
pub mod metrics;

use std::io;
use std::path::{Path, PathBuf};

pub use canvas::{Canvas, DrawOp, Page, SealedDocument};
pub use merge::{MergeOutcome, merge_sources};
pub use metrics::{Font, string_width};

/// `<target>.<suffix>`, next to the target so the final rename stays on one
/// filesystem.
pub(crate) fn side_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `bytes` to a side file and rename it over `target`.
///
/// On failure the side file is removed and `target` is left as it was.
pub(crate) fn write_via_side_file(target: &Path, suffix: &str, bytes: &[u8]) -> io::Result<()> {
    let side = side_path(target, suffix);
    let result = std::fs::write(&side, bytes).and_then(|()| std::fs::rename(&side, target));
    if result.is_err() {
        let _ = std::fs::remove_file(&side);
    }
    result
}

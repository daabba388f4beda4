// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable output for the command line.

use bindewerk_core::{AssemblyResult, AssemblyStatus, ConvertConfig};
use bindewerk_document::Capabilities;

/// Document path on stdout; summary, warnings and failures on stderr.
pub fn print_result(result: &AssemblyResult) {
    match (&result.status, &result.document_path) {
        (AssemblyStatus::Succeeded, Some(path)) => {
            println!("{}", path.display());
            eprintln!(
                "{} page(s), {} PDF(s) merged, {} warning(s)",
                result.page_count,
                result.merged_pdfs,
                result.warnings.len()
            );
        }
        (AssemblyStatus::Succeeded, None) => eprintln!("conversion finished without a document"),
        (AssemblyStatus::Failed { reason }, _) => eprintln!("conversion failed: {reason}"),
    }

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
}

pub fn print_capabilities(config: &ConvertConfig, capabilities: &Capabilities) {
    println!(
        "frame decoder ({}): {}",
        config.ffmpeg_path.display(),
        availability(capabilities.frame_decoder)
    );
    println!(
        "media probe ({}): {}",
        config.ffprobe_path.display(),
        availability(capabilities.media_probe)
    );
    println!("docx text: {}", availability(capabilities.document_text));
}

fn availability(present: bool) -> &'static str {
    if present { "available" } else { "missing" }
}

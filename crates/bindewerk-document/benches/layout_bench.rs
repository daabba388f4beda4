// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the text layout path in bindewerk-document:
// greedy word wrap alone, and composing a text-heavy batch onto a canvas.

use std::path::PathBuf;
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use bindewerk_core::{ConversionItem, ConvertConfig};
use bindewerk_document::pdf::Font;
use bindewerk_document::{Content, DocumentAssembler, PreparedItem, wrap_text};

/// Roughly 60 KiB of prose split into paragraphs of varying length.
fn sample_text() -> String {
    let sentence = "Bindewerk lays out every uploaded file on its own page group, wrapping body text greedily. ";
    (0..200)
        .map(|n| sentence.repeat(1 + n % 6))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn bench_wrap_text(c: &mut Criterion) {
    let text = sample_text();
    c.bench_function("wrap_text (A4 body width)", |b| {
        b.iter(|| wrap_text(black_box(&text), 495.28, Font::Helvetica, 10.0));
    });
}

fn bench_compose(c: &mut Criterion) {
    let text = sample_text();
    let items: Vec<PreparedItem> = (0..10)
        .map(|n| PreparedItem {
            item: ConversionItem::new(format!("chapter-{n}.txt"), PathBuf::from("/unused")),
            content: Content::Text(text.clone()),
        })
        .collect();
    let assembler = DocumentAssembler::new(Arc::new(ConvertConfig::default()));

    c.bench_function("compose (10 text items)", |b| {
        b.iter(|| black_box(assembler.compose(black_box(&items))).page_count());
    });
}

criterion_group!(benches, bench_wrap_text, bench_compose);
criterion_main!(benches);

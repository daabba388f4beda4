// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pipeline — classify, extract, assemble, seal, merge.
//
// Extraction runs as one task per item behind a semaphore. Assembly and
// merging are CPU-bound and run on the blocking pool. The caller always gets
// an `AssemblyResult`: either a usable document (possibly with degraded
// items) or a failure with no document path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bindewerk_core::error::{BindewerkError, Result};
use bindewerk_core::{
    AssemblyResult, AssemblyStatus, Category, ConversionItem, ConvertConfig, Warning, WarningKind,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::assemble::{DocumentAssembler, PreparedItem};
use crate::extract::{Capabilities, Content, ExtractContext, Extraction, ExtractorSet};
use crate::pdf::{MergeOutcome, SealedDocument, merge_sources};
use crate::workspace::BatchWorkspace;

/// One already-saved upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Filename as supplied by the uploader; drives classification.
    pub original_name: String,
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(original_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            original_name: original_name.into(),
            path: path.into(),
        }
    }

    /// Use the file's own name as the original name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            original_name,
            path,
        }
    }
}

/// Converts batches of uploads into one PDF each.
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    config: Arc<ConvertConfig>,
    capabilities: Capabilities,
    extractors: ExtractorSet,
}

impl ConversionPipeline {
    /// Validate `config` and probe for optional tooling.
    pub async fn new(config: ConvertConfig) -> Result<Self> {
        config.validate()?;
        let capabilities = Capabilities::probe(&config).await;
        Ok(Self::with_capabilities(config, capabilities))
    }

    /// Build a pipeline with known capabilities, skipping the probe.
    pub fn with_capabilities(config: ConvertConfig, capabilities: Capabilities) -> Self {
        Self {
            config: Arc::new(config),
            capabilities,
            extractors: ExtractorSet::new(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Convert one batch. The workspace's scratch directory is removed before
    /// this returns.
    #[instrument(skip_all, fields(items = sources.len()))]
    pub async fn run(&self, sources: Vec<SourceFile>, workspace: BatchWorkspace) -> AssemblyResult {
        let result = self.run_batch(sources, &workspace).await;
        workspace.close();
        match &result.status {
            AssemblyStatus::Succeeded => info!(
                pages = result.page_count,
                merged = result.merged_pdfs,
                warnings = result.warnings.len(),
                "Batch converted"
            ),
            AssemblyStatus::Failed { reason } => {
                warn!(%reason, "Batch failed")
            }
        }
        result
    }

    async fn run_batch(&self, sources: Vec<SourceFile>, workspace: &BatchWorkspace) -> AssemblyResult {
        if sources.is_empty() {
            return AssemblyResult::failed(BindewerkError::EmptyBatch.to_string(), Vec::new());
        }

        let (prepared, mut warnings) = self.prepare(sources, workspace.scratch_dir()).await;

        if let Err(err) = tokio::fs::create_dir_all(workspace.output_dir()).await {
            return AssemblyResult::failed(
                format!(
                    "cannot create output directory {}: {}",
                    workspace.output_dir().display(),
                    err
                ),
                warnings,
            );
        }

        let pdf_sources: Vec<PathBuf> = prepared
            .iter()
            .filter(|p| p.item.category() == Category::Pdf)
            .map(|p| p.item.source_path.clone())
            .collect();
        let pdf_count = pdf_sources.len();

        let assembler = DocumentAssembler::new(Arc::clone(&self.config));
        let output_path = workspace.output_path();
        let finished = tokio::task::spawn_blocking(move || -> Result<(SealedDocument, MergeOutcome)> {
            let sealed = assembler.assemble(&prepared, &output_path)?;
            let merge = merge_sources(&sealed.path, &pdf_sources);
            Ok((sealed, merge))
        })
        .await
        .map_err(|err| BindewerkError::Task(err.to_string()))
        .and_then(|res| res);

        let (sealed, merge) = match finished {
            Ok(done) => done,
            Err(err) => return AssemblyResult::failed(err.to_string(), warnings),
        };

        let (page_count, merged_pdfs) = match merge {
            MergeOutcome::Skipped => (sealed.page_count, 0),
            MergeOutcome::Merged { page_count, .. } => (page_count, pdf_count),
            MergeOutcome::Failed { reason } => {
                warnings.push(Warning::batch(
                    WarningKind::MergeFailed,
                    format!("source PDFs not merged, unmerged document kept: {reason}"),
                ));
                (sealed.page_count, 0)
            }
        };

        AssemblyResult::succeeded(sealed.path, page_count, merged_pdfs, warnings)
    }

    /// Classify `sources` and extract every item, in submission order.
    async fn prepare(&self, sources: Vec<SourceFile>, scratch_dir: &Path) -> (Vec<PreparedItem>, Vec<Warning>) {
        let items: Vec<ConversionItem> = sources
            .into_iter()
            .map(|source| ConversionItem::new(source.original_name, source.path))
            .collect();
        info!(count = items.len(), "Batch classified");
        self.extract_all(items, scratch_dir).await
    }

    /// Extract every item concurrently, returning results in submission
    /// order.
    ///
    /// Dropping the returned future aborts the outstanding tasks, which in
    /// turn kills any external process they are waiting on.
    async fn extract_all(
        &self,
        items: Vec<ConversionItem>,
        scratch_dir: &Path,
    ) -> (Vec<PreparedItem>, Vec<Warning>) {
        let ctx = Arc::new(ExtractContext {
            config: Arc::clone(&self.config),
            capabilities: self.capabilities,
            scratch_dir: scratch_dir.to_path_buf(),
        });
        let permits = Arc::new(Semaphore::new(self.config.max_parallel_extractions.max(1)));

        let mut tasks = JoinSet::new();
        for (index, item) in items.iter().cloned().enumerate() {
            let ctx = Arc::clone(&ctx);
            let permits = Arc::clone(&permits);
            let extractors = self.extractors;
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (index, extractors.extract(index, &item, &ctx).await)
            });
        }

        let mut finished: Vec<Option<Extraction>> = items.iter().map(|_| None).collect();
        let mut last_error: Option<String> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, extraction)) => finished[index] = Some(extraction),
                Err(err) => {
                    warn!(%err, "Extraction task aborted");
                    last_error = Some(err.to_string());
                }
            }
        }

        let mut prepared = Vec::with_capacity(items.len());
        let mut warnings = Vec::new();
        for (index, (item, extraction)) in items.into_iter().zip(finished).enumerate() {
            let extraction = extraction.unwrap_or_else(|| {
                let reason = last_error.as_deref().unwrap_or("task did not complete");
                Extraction::degraded(
                    Content::Absent,
                    Warning::for_item(
                        index,
                        &item,
                        WarningKind::ExtractionAborted,
                        format!("extraction task failed: {reason}"),
                    ),
                )
            });
            warnings.extend(extraction.warnings);
            prepared.push(PreparedItem {
                item,
                content: extraction.content,
            });
        }
        (prepared, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Canvas, Font};
    use crate::render::{IMAGE_UNRENDERABLE, NO_FRAME};
    use bindewerk_core::PaperSize;
    use lopdf::{Document, Object};

    fn pipeline(config: ConvertConfig, capabilities: Capabilities) -> ConversionPipeline {
        ConversionPipeline::with_capabilities(config, capabilities)
    }

    fn no_tools() -> Capabilities {
        Capabilities::with_tools(false, false)
    }

    fn workspace(root: &Path) -> BatchWorkspace {
        BatchWorkspace::create(&root.join("scratch"), root.join("out")).expect("workspace")
    }

    fn write_pdf(path: &Path, paper: PaperSize, pages: usize) {
        let mut canvas = Canvas::new(paper, "fixture");
        for n in 0..pages {
            canvas.draw_text(72.0, 700.0, Font::Helvetica, 12.0, format!("fixture {n}"));
            canvas.page_break();
        }
        canvas.seal(path).expect("seal fixture");
    }

    /// Text drawn on each page when `sources` go through the same
    /// extraction and composition as `run`.
    async fn composed_pages(pipeline: &ConversionPipeline, sources: Vec<SourceFile>) -> Vec<Vec<String>> {
        let scratch = tempfile::tempdir().expect("scratch");
        let (prepared, _) = pipeline.prepare(sources, scratch.path()).await;
        DocumentAssembler::new(Arc::clone(&pipeline.config))
            .compose(&prepared)
            .pages()
            .map(|page| page.texts().map(str::to_owned).collect())
            .collect()
    }

    fn page_widths(path: &Path) -> Vec<f32> {
        let doc = Document::load(path).expect("load output");
        doc.get_pages()
            .into_values()
            .map(|id| {
                let page = doc.get_object(id).and_then(Object::as_dict).expect("page");
                let media_box = page
                    .get(b"MediaBox")
                    .or_else(|_| {
                        let parent = page.get(b"Parent")?.as_reference()?;
                        doc.get_object(parent)?.as_dict()?.get(b"MediaBox")
                    })
                    .and_then(Object::as_array)
                    .expect("media box");
                let x0 = media_box[0].as_float().expect("x0");
                let x1 = media_box[2].as_float().expect("x1");
                x1 - x0
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_batch_fails_without_document() {
        let root = tempfile::tempdir().expect("tempdir");
        let ws = workspace(root.path());
        let scratch = ws.scratch_dir().to_path_buf();

        let result = pipeline(ConvertConfig::default(), no_tools()).run(Vec::new(), ws).await;
        assert!(!result.is_success());
        assert!(result.document_path.is_none());
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn corrupt_image_degrades_only_that_item() {
        let root = tempfile::tempdir().expect("tempdir");
        let text = root.path().join("upload-1");
        let image = root.path().join("upload-2");
        std::fs::write(&text, "The actual text content").expect("write text");
        std::fs::write(&image, b"\x89PNG\r\n\x1a\n but truncated").expect("write image");

        let sources = vec![
            SourceFile::new("readme.txt", &text),
            SourceFile::new("photo.png", &image),
        ];
        let pipeline = pipeline(ConvertConfig::default(), no_tools());
        let result = pipeline.run(sources.clone(), workspace(root.path())).await;

        assert!(result.is_success(), "{result:?}");
        assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
        assert_eq!(result.warnings[0].kind, WarningKind::ImageUndecodable);
        assert_eq!(result.warnings[0].item, Some(1));
        // Cover plus one page per item.
        assert_eq!(result.page_count, 3);
        let path = result.document_path.expect("document path");
        assert_eq!(Document::load(&path).expect("load").get_pages().len(), 3);

        let pages = composed_pages(&pipeline, sources).await;
        assert_eq!(pages.len(), 3);
        assert!(pages[1].iter().any(|t| t == "The actual text content"), "{:?}", pages[1]);
        assert!(!pages[1].iter().any(|t| t == IMAGE_UNRENDERABLE));
        assert!(pages[2].iter().any(|t| t == IMAGE_UNRENDERABLE), "{:?}", pages[2]);
    }

    #[tokio::test]
    async fn video_without_decoder_still_succeeds_and_cleans_scratch() {
        let root = tempfile::tempdir().expect("tempdir");
        let video = root.path().join("upload.mp4");
        std::fs::write(&video, b"not really a video").expect("write");
        let config = ConvertConfig {
            ffmpeg_path: root.path().join("missing-ffmpeg"),
            ..ConvertConfig::default()
        };
        let ws = workspace(root.path());
        let scratch = ws.scratch_dir().to_path_buf();

        // Decoder reported present so the capture is actually attempted.
        let pipeline = pipeline(config, Capabilities::with_tools(true, false));
        let sources = vec![SourceFile::new("holiday.mp4", &video)];
        let result = pipeline.run(sources.clone(), ws).await;

        assert!(result.is_success(), "{result:?}");
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::FrameUnavailable)
        );
        assert_eq!(result.page_count, 2);
        assert!(!scratch.exists());

        let pages = composed_pages(&pipeline, sources).await;
        assert!(pages[1].iter().any(|t| t == NO_FRAME), "{:?}", pages[1]);
    }

    #[tokio::test]
    async fn undetected_decoder_draws_no_frame_marker() {
        let root = tempfile::tempdir().expect("tempdir");
        let video = root.path().join("upload.mkv");
        std::fs::write(&video, b"not really a video").expect("write");

        let pipeline = pipeline(ConvertConfig::default(), no_tools());
        let pages = composed_pages(&pipeline, vec![SourceFile::new("clip.mkv", &video)]).await;
        assert_eq!(pages.len(), 2);
        assert!(pages[1].iter().any(|t| t == NO_FRAME), "{:?}", pages[1]);
        assert!(pages[1].iter().any(|t| t.contains("\"size_bytes\":18")), "{:?}", pages[1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dropped_run_kills_running_extractions() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().expect("tempdir");
        let video = root.path().join("upload.mp4");
        std::fs::write(&video, b"x").expect("write");
        let finished = root.path().join("decoder-finished");
        let decoder = root.path().join("slow-ffmpeg");
        std::fs::write(
            &decoder,
            format!("#!/bin/sh\nsleep 1\ntouch \"{}\"\n", finished.display()),
        )
        .expect("write script");
        std::fs::set_permissions(&decoder, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let config = ConvertConfig {
            ffmpeg_path: decoder,
            ..ConvertConfig::default()
        };
        let ws = workspace(root.path());
        let scratch = ws.scratch_dir().to_path_buf();
        let pipeline = pipeline(config, Capabilities::with_tools(true, false));

        let run = pipeline.run(vec![SourceFile::new("clip.mp4", &video)], ws);
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(300), run).await;
        assert!(outcome.is_err(), "batch should still be running");

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(!finished.exists(), "decoder kept running after the batch was dropped");
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn pdf_pages_are_appended_after_item_pages() {
        let root = tempfile::tempdir().expect("tempdir");
        let a = root.path().join("a");
        let b = root.path().join("b");
        let c = root.path().join("c");
        std::fs::write(&a, "alpha").expect("write a");
        write_pdf(&b, PaperSize::Letter, 2);
        ::image::DynamicImage::new_rgb8(40, 30)
            .save_with_format(&c, ::image::ImageFormat::Png)
            .expect("write c");

        let result = pipeline(ConvertConfig::default(), no_tools())
            .run(
                vec![
                    SourceFile::new("A.txt", &a),
                    SourceFile::new("B.pdf", &b),
                    SourceFile::new("C.png", &c),
                ],
                workspace(root.path()),
            )
            .await;

        assert!(result.is_success(), "{result:?}");
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.merged_pdfs, 1);
        // Cover, A, B marker, C, then B's two Letter pages.
        assert_eq!(result.page_count, 6);

        let widths = page_widths(&result.document_path.expect("path"));
        assert_eq!(widths.len(), 6);
        for w in &widths[..4] {
            assert!((w - 595.28).abs() < 1.0, "primary page width {w}");
        }
        for w in &widths[4..] {
            assert!((w - 612.0).abs() < 1.0, "merged page width {w}");
        }
    }

    #[tokio::test]
    async fn unreadable_pdf_is_a_merge_warning_not_a_failure() {
        let root = tempfile::tempdir().expect("tempdir");
        let bad = root.path().join("bad");
        std::fs::write(&bad, b"%PDF-1.7\n garbage").expect("write");

        let result = pipeline(ConvertConfig::default(), no_tools())
            .run(vec![SourceFile::new("scan.pdf", &bad)], workspace(root.path()))
            .await;

        assert!(result.is_success(), "{result:?}");
        assert_eq!(result.merged_pdfs, 0);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::MergeFailed);
        assert_eq!(result.warnings[0].item, None);
        let path = result.document_path.expect("path");
        assert_eq!(Document::load(&path).expect("load").get_pages().len(), 2);
    }

    #[tokio::test]
    async fn uncreatable_output_directory_fails_batch() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").expect("write");
        let text = root.path().join("t");
        std::fs::write(&text, "x").expect("write");
        let ws = BatchWorkspace::create(root.path(), blocker.join("out")).expect("workspace");

        let result = pipeline(ConvertConfig::default(), no_tools())
            .run(vec![SourceFile::new("t.txt", &text)], ws)
            .await;
        assert!(!result.is_success());
        assert!(result.document_path.is_none());
    }

    #[tokio::test]
    async fn serial_extraction_keeps_submission_order() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = ConvertConfig {
            max_parallel_extractions: 1,
            ..ConvertConfig::default()
        };
        let sources: Vec<SourceFile> = (0..5)
            .map(|n| {
                let path = root.path().join(format!("missing-{n}"));
                SourceFile::new(format!("f{n}.txt"), path)
            })
            .collect();

        let result = pipeline(config, no_tools()).run(sources, workspace(root.path())).await;
        assert!(result.is_success());
        let indices: Vec<Option<usize>> = result.warnings.iter().map(|w| w.item).collect();
        assert_eq!(indices, (0..5).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn source_file_from_path_uses_file_name() {
        let source = SourceFile::from_path("/uploads/Quarterly Report.docx");
        assert_eq!(source.original_name, "Quarterly Report.docx");
    }
}

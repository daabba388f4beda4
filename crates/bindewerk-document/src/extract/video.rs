// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Video extraction — one still frame captured with the external frame
// decoder, plus the same container metadata recorded for audio.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bindewerk_core::error::Result;
use bindewerk_core::{ConversionItem, ConvertConfig, Warning, WarningKind};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::media::read_media_metadata;
use super::process::run_bounded;
use super::{Capability, Content, ExtractContext, Extraction, Extractor, FrameOutcome};
use crate::image::DecodedImage;

/// Captures a frame into the batch scratch directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoExtractor;

#[async_trait]
impl Extractor for VideoExtractor {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn extract(&self, index: usize, item: &ConversionItem, ctx: &ExtractContext) -> Extraction {
        let mut warnings = Vec::new();
        let metadata = read_media_metadata(index, item, ctx, &mut warnings).await;

        // Metadata is recorded either way; only the frame needs the decoder.
        if !ctx.capabilities.has(Capability::FrameDecoder) {
            warn!(title = %item.title, "Frame decoder unavailable");
            warnings.push(Warning::for_item(
                index,
                item,
                WarningKind::CapabilityUnavailable,
                format!("{} unavailable, frame capture skipped", Capability::FrameDecoder),
            ));
            return Extraction {
                content: Content::Media {
                    metadata,
                    frame: FrameOutcome::Failed,
                },
                warnings,
            };
        }

        let output = ctx
            .scratch_dir
            .join(format!("{}.jpg", Uuid::new_v4().simple()));
        let frame = match capture_frame(&ctx.config, item.source_path(), &output).await {
            Ok(true) => decode_frame(index, item, output, &mut warnings).await,
            Ok(false) => {
                warnings.push(Warning::for_item(
                    index,
                    item,
                    WarningKind::FrameUnavailable,
                    "frame decoder produced no frame",
                ));
                FrameOutcome::Failed
            }
            Err(err) => {
                warn!(title = %item.title, %err, "Frame capture failed");
                warnings.push(Warning::for_item(
                    index,
                    item,
                    WarningKind::FrameUnavailable,
                    format!("frame capture failed: {err}"),
                ));
                FrameOutcome::Failed
            }
        };

        Extraction {
            content: Content::Media { metadata, frame },
            warnings,
        }
    }
}

/// Run the decoder once. `Ok(true)` only when it exited cleanly and the
/// frame file exists.
#[instrument(skip_all, fields(source = %source.display()))]
async fn capture_frame(config: &ConvertConfig, source: &Path, output: &Path) -> Result<bool> {
    let args: Vec<OsString> = vec![
        "-y".into(),
        "-ss".into(),
        config.frame_timestamp_secs.to_string().into(),
        "-i".into(),
        source.as_os_str().to_os_string(),
        "-frames:v".into(),
        "1".into(),
        "-q:v".into(),
        "2".into(),
        output.as_os_str().to_os_string(),
    ];
    run_bounded(&config.ffmpeg_path, &args, config.process_timeout(), false).await?;

    let exists = tokio::fs::try_exists(output).await.unwrap_or(false);
    debug!(exists, "Frame decoder finished");
    Ok(exists)
}

async fn decode_frame(
    index: usize,
    item: &ConversionItem,
    path: PathBuf,
    warnings: &mut Vec<Warning>,
) -> FrameOutcome {
    let frame_path = path.clone();
    let decoded = tokio::task::spawn_blocking(move || DecodedImage::open(frame_path))
        .await
        .map_err(|err| err.to_string())
        .and_then(|res| res.map_err(|err| err.to_string()));

    match decoded {
        Ok(image) => FrameOutcome::Captured { path, image },
        Err(reason) => {
            warnings.push(Warning::for_item(
                index,
                item,
                WarningKind::FrameUnavailable,
                format!("captured frame undecodable: {reason}"),
            ));
            FrameOutcome::Undecodable { path }
        }
    }
}

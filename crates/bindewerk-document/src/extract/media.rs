// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Container metadata for audio and video items: byte size from the
// filesystem, duration from the media probe (ffprobe JSON output).

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use bindewerk_core::error::Result;
use bindewerk_core::{ConversionItem, ConvertConfig, MediaMetadata, Warning, WarningKind};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::process::run_bounded;
use super::{Capability, Content, ExtractContext, Extraction, Extractor, FrameOutcome};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Audio is never embedded; only its metadata is extracted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioExtractor;

#[async_trait]
impl Extractor for AudioExtractor {
    fn name(&self) -> &'static str {
        "audio"
    }

    async fn extract(&self, index: usize, item: &ConversionItem, ctx: &ExtractContext) -> Extraction {
        let mut warnings = Vec::new();
        let metadata = read_media_metadata(index, item, ctx, &mut warnings).await;
        Extraction {
            content: Content::Media {
                metadata,
                frame: FrameOutcome::NotApplicable,
            },
            warnings,
        }
    }
}

/// Size and (when the probe can tell) duration of `item`.
///
/// Returns `None` only when the file cannot be statted. A missing duration
/// is recorded as a warning, never as a failure.
pub(crate) async fn read_media_metadata(
    index: usize,
    item: &ConversionItem,
    ctx: &ExtractContext,
    warnings: &mut Vec<Warning>,
) -> Option<MediaMetadata> {
    let size_bytes = match tokio::fs::metadata(item.source_path()).await {
        Ok(meta) => meta.len(),
        Err(err) => {
            warn!(title = %item.title, %err, "Cannot stat media file");
            warnings.push(Warning::for_item(
                index,
                item,
                WarningKind::MetadataUnavailable,
                format!("cannot read file size: {err}"),
            ));
            return None;
        }
    };

    let duration_secs = if !ctx.capabilities.has(Capability::MediaProbe) {
        warnings.push(Warning::for_item(
            index,
            item,
            WarningKind::MetadataUnavailable,
            format!("{} unavailable, duration omitted", Capability::MediaProbe),
        ));
        None
    } else {
        match probe_duration(&ctx.config, item.source_path()).await {
            Ok(Some(raw)) => Some(MediaMetadata::round_duration(raw)),
            Ok(None) => {
                warnings.push(Warning::for_item(
                    index,
                    item,
                    WarningKind::MetadataUnavailable,
                    "duration could not be determined",
                ));
                None
            }
            Err(err) => {
                warn!(title = %item.title, %err, "Media probe failed");
                warnings.push(Warning::for_item(
                    index,
                    item,
                    WarningKind::MetadataUnavailable,
                    format!("duration unavailable: {err}"),
                ));
                None
            }
        }
    };

    Some(MediaMetadata {
        duration_secs,
        size_bytes,
    })
}

/// Container duration in seconds, or `None` when the probe reports none.
#[instrument(skip_all, fields(path = %path.display()))]
async fn probe_duration(config: &ConvertConfig, path: &Path) -> Result<Option<f64>> {
    let args: [&OsStr; 7] = [
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-show_entries"),
        OsStr::new("format=duration"),
        OsStr::new("-of"),
        OsStr::new("json"),
        path.as_os_str(),
    ];
    let output = run_bounded(&config.ffprobe_path, args, config.process_timeout(), true).await?;
    let duration = parse_duration(&output.stdout)?;
    debug!(?duration, "Duration probed");
    Ok(duration)
}

fn parse_duration(stdout: &[u8]) -> Result<Option<f64>> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)?;
    Ok(parsed
        .format
        .and_then(|format| format.duration)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Capabilities, test_support};

    #[test]
    fn parses_probe_json() {
        let json = br#"{"format": {"duration": "12.345000"}}"#;
        assert_eq!(parse_duration(json).expect("parse"), Some(12.345));
    }

    #[test]
    fn missing_or_zero_duration_is_none() {
        assert_eq!(parse_duration(br#"{"format": {}}"#).expect("parse"), None);
        assert_eq!(parse_duration(br#"{}"#).expect("parse"), None);
        assert_eq!(
            parse_duration(br#"{"format": {"duration": "N/A"}}"#).expect("parse"),
            None
        );
        assert_eq!(
            parse_duration(br#"{"format": {"duration": "0.000"}}"#).expect("parse"),
            None
        );
    }

    #[test]
    fn malformed_probe_output_is_an_error() {
        assert!(parse_duration(b"not json").is_err());
    }

    #[tokio::test]
    async fn size_is_recorded_without_probe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, vec![0u8; 1234]).expect("write");
        let ctx = test_support::context(dir.path(), Capabilities::with_tools(false, false));

        let extraction = AudioExtractor
            .extract(0, &ConversionItem::new("song.mp3", &path), &ctx)
            .await;
        match extraction.content {
            Content::Media {
                metadata: Some(meta),
                frame: FrameOutcome::NotApplicable,
            } => {
                assert_eq!(meta.size_bytes, 1234);
                assert_eq!(meta.duration_secs, None);
            }
            other => panic!("unexpected content: {other:?}"),
        }
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].kind, WarningKind::MetadataUnavailable);
    }

    #[tokio::test]
    async fn unstatable_file_has_no_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = test_support::context(dir.path(), Capabilities::with_tools(false, true));
        let item = ConversionItem::new("gone.wav", dir.path().join("gone.wav"));

        let extraction = AudioExtractor.extract(0, &item, &ctx).await;
        assert!(matches!(
            extraction.content,
            Content::Media { metadata: None, .. }
        ));
        assert_eq!(extraction.warnings.len(), 1);
    }
}

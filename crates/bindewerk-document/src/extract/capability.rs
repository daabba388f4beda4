// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optional tooling detection, done once per pipeline.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use bindewerk_core::ConvertConfig;
use serde::Serialize;
use tracing::{info, instrument};

use super::process::run_bounded;

/// Upper bound on a `-version` probe, regardless of the configured timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A piece of optional tooling an extractor may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    FrameDecoder,
    MediaProbe,
    DocumentText,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FrameDecoder => "frame decoder",
            Self::MediaProbe => "media probe",
            Self::DocumentText => "document text parser",
        })
    }
}

/// Which capabilities are available to this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub frame_decoder: bool,
    pub media_probe: bool,
    pub document_text: bool,
}

impl Capabilities {
    /// Detect the configured tools by running them with `-version`.
    #[instrument(skip_all)]
    pub async fn probe(config: &ConvertConfig) -> Self {
        let timeout = config.process_timeout().min(PROBE_TIMEOUT);
        let (frame_decoder, media_probe) = tokio::join!(
            responds(&config.ffmpeg_path, timeout),
            responds(&config.ffprobe_path, timeout),
        );
        let capabilities = Self::with_tools(frame_decoder, media_probe);
        info!(
            frame_decoder,
            media_probe,
            document_text = capabilities.document_text,
            "Capabilities probed"
        );
        capabilities
    }

    /// Explicit tool availability; document parsing follows the `docx` feature.
    pub fn with_tools(frame_decoder: bool, media_probe: bool) -> Self {
        Self {
            frame_decoder,
            media_probe,
            document_text: cfg!(feature = "docx"),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::FrameDecoder => self.frame_decoder,
            Capability::MediaProbe => self.media_probe,
            Capability::DocumentText => self.document_text,
        }
    }

    /// The first of `required` that is not available.
    pub fn first_missing(&self, required: &[Capability]) -> Option<Capability> {
        required.iter().copied().find(|cap| !self.has(*cap))
    }
}

async fn responds(program: &Path, timeout: Duration) -> bool {
    run_bounded(program, ["-version"], timeout, false)
        .await
        .is_ok()
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BindewerkError, Result};

/// Settings for one pipeline instance.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Page size of the assembled document.
    pub paper_size: crate::PaperSize,
    /// Heading drawn at the top of the cover page.
    pub cover_title: String,
    /// Font size for body text (text files, document paragraphs).
    pub body_font_size: f32,
    /// Vertical advance between body text lines, in points.
    pub body_line_height: f32,
    /// Frame decoder executable (ffmpeg-compatible command line).
    pub ffmpeg_path: PathBuf,
    /// Media probe executable (ffprobe-compatible command line).
    pub ffprobe_path: PathBuf,
    /// Timestamp of the video frame to capture.
    pub frame_timestamp_secs: f64,
    /// Upper bound on any single external process run.
    pub process_timeout_secs: u64,
    /// Maximum number of items extracted concurrently.
    pub max_parallel_extractions: usize,
    /// Parent directory for batch scratch space; system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            cover_title: "Converted Files".into(),
            body_font_size: 10.0,
            body_line_height: 12.0,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            frame_timestamp_secs: 1.0,
            process_timeout_secs: 30,
            max_parallel_extractions: 4,
            scratch_root: None,
        }
    }
}

impl ConvertConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.process_timeout_secs == 0 {
            return Err(BindewerkError::Config(
                "process_timeout_secs must be at least 1".into(),
            ));
        }
        if self.max_parallel_extractions == 0 {
            return Err(BindewerkError::Config(
                "max_parallel_extractions must be at least 1".into(),
            ));
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.body_font_size) || !positive(self.body_line_height) {
            return Err(BindewerkError::Config(
                "body_font_size and body_line_height must be positive".into(),
            ));
        }
        if !self.frame_timestamp_secs.is_finite() || self.frame_timestamp_secs < 0.0 {
            return Err(BindewerkError::Config(
                "frame_timestamp_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    /// Directory under which batch scratch space is created.
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConvertConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.process_timeout(), Duration::from_secs(30));
        assert_eq!(config.paper_size, crate::PaperSize::A4);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bindewerk.json");
        std::fs::write(&path, r#"{ "paper_size": "letter", "process_timeout_secs": 5 }"#)
            .expect("write config");

        let config = ConvertConfig::load(&path).expect("load");
        assert_eq!(config.paper_size, crate::PaperSize::Letter);
        assert_eq!(config.process_timeout_secs, 5);
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.cover_title, "Converted Files");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ConvertConfig {
            process_timeout_secs: 0,
            ..ConvertConfig::default()
        };
        assert!(matches!(config.validate(), Err(BindewerkError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ paper_size: ").expect("write config");
        assert!(matches!(
            ConvertConfig::load(&path),
            Err(BindewerkError::Serialization(_))
        ));
    }
}

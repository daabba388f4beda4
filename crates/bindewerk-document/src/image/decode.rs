// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bitmap decoding for image items and captured video frames, using the
// `image` crate.

use std::path::Path;

use bindewerk_core::error::{BindewerkError, Result};
use image::{DynamicImage, ImageReader, RgbImage};
use tracing::{debug, instrument};

/// A fully decoded bitmap with known pixel dimensions.
///
/// Decoding either succeeds completely or fails; there is no partially
/// decoded state.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
}

impl DecodedImage {
    /// Decode the file at `path`.
    ///
    /// The format is sniffed from the content; the extension is only used
    /// when the content is not recognised.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(|err| {
                BindewerkError::ImageError(format!("failed to open {}: {}", path.display(), err))
            })?
            .with_guessed_format()
            .map_err(|err| {
                BindewerkError::ImageError(format!("failed to read {}: {}", path.display(), err))
            })?
            .decode()
            .map_err(|err| {
                BindewerkError::ImageError(format!("failed to decode {}: {}", path.display(), err))
            })?;
        debug!(width = image.width(), height = image.height(), "Image decoded");
        Ok(Self { image })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| BindewerkError::ImageError(format!("failed to decode image: {}", err)))?;
        Ok(Self { image })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// 8-bit RGB pixels, alpha discarded.
    pub fn to_rgb8(&self) -> RgbImage {
        self.image.to_rgb8()
    }
}

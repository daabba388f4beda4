// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bitmap extraction for image items.

use async_trait::async_trait;
use bindewerk_core::{ConversionItem, Warning, WarningKind};
use tracing::warn;

use super::{Content, ExtractContext, Extraction, Extractor};
use crate::image::DecodedImage;

/// Decodes the file completely on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageExtractor;

#[async_trait]
impl Extractor for ImageExtractor {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn extract(&self, index: usize, item: &ConversionItem, _ctx: &ExtractContext) -> Extraction {
        let path = item.source_path().to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || DecodedImage::open(path))
            .await
            .map_err(|err| err.to_string())
            .and_then(|res| res.map_err(|err| err.to_string()));

        match decoded {
            Ok(image) => Extraction::ok(Content::Bitmap(image)),
            Err(reason) => {
                warn!(title = %item.title, %reason, "Image undecodable");
                Extraction::degraded(
                    Content::Absent,
                    Warning::for_item(index, item, WarningKind::ImageUndecodable, reason),
                )
            }
        }
    }
}

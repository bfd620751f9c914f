// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page post-processor: luminance flattening, global binarization, and the
// lossy rounding used when a document is assembled below full quality.

use folioscan_core::error::FolioscanError;
use image::{DynamicImage, ImageFormat};
use imageproc::contrast::{ThresholdType, otsu_level, threshold_mut};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How the black/white cut-off is chosen for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threshold {
    /// Fixed global level in `0..=255`.
    Fixed(u8),
    /// Level computed from the page's luminance histogram.
    Otsu,
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Fixed(200)
    }
}

/// Binarize `raw` at `threshold`.
///
/// The image is flattened to 8-bit luminance first. With a fixed level, pixels
/// at or above the level become white (255) and everything below becomes
/// black (0). The Otsu level is the brightest value of the dark class, so only
/// pixels strictly above it become white. Running it again on its own output
/// with the same threshold changes nothing.
pub fn process(raw: &DynamicImage, threshold: Threshold) -> DynamicImage {
    ImageProcessor::from_dynamic(raw.clone())
        .binarize(threshold)
        .into_dynamic()
}

/// Image processing pipeline operating on a single captured page.
///
/// Each method consumes `self` and returns the transformed processor, so
/// steps chain:
///
/// ```ignore
/// let page = ImageProcessor::open("wrs-temp/Book/context/Preface_1.png")?
///     .binarize(Threshold::Fixed(200))
///     .round_trip_jpeg(80)?
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load a staged capture from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, FolioscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FolioscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Capture loaded");
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Produce a pure black/white page.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn binarize(self, threshold: Threshold) -> Self {
        let mut gray = self.image.to_luma8();
        let lightest_black = match threshold {
            Threshold::Fixed(level) => level.checked_sub(1),
            Threshold::Otsu => {
                let level = otsu_level(&gray);
                debug!(level, "Otsu level computed");
                Some(level)
            }
        };

        match lightest_black {
            Some(level) => threshold_mut(&mut gray, level, ThresholdType::Binary),
            // A fixed level of 0 puts every pixel at or above it.
            None => gray.pixels_mut().for_each(|p| p.0[0] = 255),
        }

        Self {
            image: DynamicImage::ImageLuma8(gray),
        }
    }

    /// Round pixel data through JPEG at `quality` (clamped to 1-100).
    ///
    /// Dimensions and colour type are preserved; only the encoder's lossy
    /// rounding changes pixel values.
    pub fn round_trip_jpeg(self, quality: u8) -> Result<Self, FolioscanError> {
        let is_gray = matches!(self.image, DynamicImage::ImageLuma8(_));
        let bytes = self.to_jpeg_bytes(quality)?;
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).map_err(
            |err| FolioscanError::ImageError(format!("JPEG decoding failed: {}", err)),
        )?;
        let image = if is_gray {
            DynamicImage::ImageLuma8(decoded.to_luma8())
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };
        Ok(Self { image })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as JPEG; grayscale pages stay single-channel.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, FolioscanError> {
        let mut buffer = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let result = match &self.image {
            DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder),
            other => other.to_rgb8().write_with_encoder(encoder),
        };
        result.map_err(|err| FolioscanError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

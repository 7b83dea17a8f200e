// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoder — alpha flattening and lossy recompression of page bitmaps into
// WebP (libwebp via the `webp` crate) or JPEG (`image`).

use censura_core::config::OutputFormat;
use censura_core::error::{CensuraError, Result};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, instrument};

/// libwebp effort level: 0 is fastest, 6 compresses hardest.
const WEBP_MAX_METHOD: i32 = 6;

/// Output format and quality for page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub format: OutputFormat,
    /// 0–100; values above 100 are clamped.
    pub quality: u8,
}

/// An encoded page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Composite `image` onto opaque white and drop any alpha channel.
///
/// Fully transparent pixels come out white; opaque pixels are unchanged.
pub fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |channel: u8| -> u8 {
            let alpha = a as u32;
            ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Flatten and encode `image` with the given settings.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn encode(image: &DynamicImage, settings: EncodeSettings) -> Result<EncodedImage> {
    let rgb = flatten_alpha(image);
    let quality = settings.quality.min(100);
    let bytes = match settings.format {
        OutputFormat::WebP => encode_webp(&rgb, quality)?,
        OutputFormat::Jpeg => encode_jpeg(&rgb, quality)?,
    };
    debug!(bytes = bytes.len(), format = ?settings.format, quality, "Page encoded");
    Ok(EncodedImage {
        bytes,
        format: settings.format,
        width: rgb.width(),
        height: rgb.height(),
    })
}

fn encode_webp(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| CensuraError::Encode("libwebp rejected its default configuration".into()))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = WEBP_MAX_METHOD;

    let encoder = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|err| CensuraError::Encode(format!("WebP encoding failed: {:?}", err)))?;
    Ok(memory.to_vec())
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.max(1));
    rgb.write_with_encoder(encoder)
        .map_err(|err| CensuraError::Encode(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

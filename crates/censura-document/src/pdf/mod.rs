// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the page source abstraction, the pdfium backend, and page
// rasterization.

pub mod pdfium;
pub mod source;

use censura_core::error::Result;
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::image::encode::flatten_alpha;

pub use pdfium::PdfiumLoader;
pub use source::{DocumentLoader, PageSource, TextLayer, TextRun};

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// A rendered page: an opaque RGB bitmap plus the page-to-pixel scale.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub image: DynamicImage,
    pub zoom: f32,
}

impl RasterPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Zoom factor between page units and pixels at `dpi`.
pub fn zoom_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

/// Render page `index` at `dpi` into an opaque bitmap.
///
/// Any alpha the backend produces is composited onto white, so the result
/// never carries an alpha channel.
#[instrument(skip(source))]
pub fn rasterize(source: &dyn PageSource, index: usize, dpi: u32) -> Result<RasterPage> {
    let zoom = zoom_for_dpi(dpi);
    let rendered = source.render(index, zoom)?;
    let image = DynamicImage::ImageRgb8(flatten_alpha(&rendered));
    debug!(width = image.width(), height = image.height(), zoom, "Page rasterized");
    Ok(RasterPage { image, zoom })
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redactor — paints opaque fill over sensitive regions on a copy of the page
// bitmap. The input bitmap is never modified.

use std::borrow::Cow;

use image::{DynamicImage, Rgb, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, instrument};

use crate::geometry::SensitiveRegion;

/// Fill colour for redacted areas.
pub const FILL: [u8; 3] = [0, 0, 0];

/// Paint every region solid [`FILL`] on a copy of `image`.
///
/// With no regions the input is handed back borrowed, without copying.
/// Bitmaps with alpha keep their alpha channel and get an opaque fill.
#[instrument(skip_all, fields(regions = regions.len()))]
pub fn redact<'a>(image: &'a DynamicImage, regions: &[SensitiveRegion]) -> Cow<'a, DynamicImage> {
    if regions.is_empty() {
        return Cow::Borrowed(image);
    }

    let redacted = if image.color().has_alpha() {
        let mut canvas = image.to_rgba8();
        let fill = Rgba([FILL[0], FILL[1], FILL[2], 255]);
        for region in regions {
            draw_filled_rect_mut(&mut canvas, to_pixel_rect(region), fill);
        }
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = image.to_rgb8();
        for region in regions {
            draw_filled_rect_mut(&mut canvas, to_pixel_rect(region), Rgb(FILL));
        }
        DynamicImage::ImageRgb8(canvas)
    };

    debug!("Regions painted");
    Cow::Owned(redacted)
}

fn to_pixel_rect(region: &SensitiveRegion) -> PixelRect {
    PixelRect::at(region.x0() as i32, region.y0() as i32).of_size(region.width(), region.height())
}

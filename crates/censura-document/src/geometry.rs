// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectangles, coordinate spaces, and the unifier that turns detection
// candidates into padded, clipped, pixel-space regions.

use tracing::{debug, trace};

/// Axis-aligned rectangle with `x0 <= x1` and `y0 <= y1` once normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest rectangle containing all `points`. `None` for no points.
    pub fn bounding(points: &[(f32, f32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = Self::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        Some(rect)
    }

    /// Smallest rectangle containing both.
    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// True for a finite rectangle with positive width and height.
    pub fn has_area(&self) -> bool {
        self.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(
            self.x0 * factor,
            self.y0 * factor,
            self.x1 * factor,
            self.y1 * factor,
        )
    }

    /// Swap corners so that `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(self) -> Self {
        Self::new(
            self.x0.min(self.x1),
            self.y0.min(self.y1),
            self.x0.max(self.x1),
            self.y0.max(self.y1),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Which coordinate system a rectangle is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSpace {
    /// PDF page units (1/72 inch), top-left origin.
    Page,
    /// Bitmap pixels, top-left origin.
    Pixel,
}

/// Which detection channel proposed a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    TextLayer,
    Ocr,
}

/// An unvalidated rectangle proposed by a locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRegion {
    pub rect: Rect,
    pub space: CoordinateSpace,
    pub source: RegionSource,
}

impl CandidateRegion {
    pub fn page(rect: Rect, source: RegionSource) -> Self {
        Self {
            rect,
            space: CoordinateSpace::Page,
            source,
        }
    }

    pub fn pixel(rect: Rect, source: RegionSource) -> Self {
        Self {
            rect,
            space: CoordinateSpace::Pixel,
            source,
        }
    }

    /// Resolve to pixel space. Pixel-space candidates pass through unchanged.
    pub fn into_pixel_space(self, zoom: f32) -> Self {
        match self.space {
            CoordinateSpace::Pixel => self,
            CoordinateSpace::Page => Self::pixel(self.rect.scaled(zoom), self.source),
        }
    }
}

/// A validated pixel-space rectangle, padded and clipped to its bitmap.
///
/// Always non-empty and fully inside `[0, width] × [0, height]`; covers the
/// pixels `x0..x1` × `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitiveRegion {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    source: RegionSource,
}

impl SensitiveRegion {
    /// Pad a pixel-space candidate and clip it to a `width × height` bitmap.
    ///
    /// Returns `None` for non-finite input or when nothing is left after
    /// clipping. Fractional edges are widened outward so partially covered
    /// pixels are included.
    pub fn from_candidate(
        candidate: &CandidateRegion,
        padding: u32,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        debug_assert_eq!(candidate.space, CoordinateSpace::Pixel);
        if !candidate.rect.is_finite() {
            return None;
        }
        let rect = candidate.rect.normalized();
        let pad = padding as f32;
        let clip = |value: f32, limit: u32| value.clamp(0.0, limit as f32) as u32;

        let x0 = clip((rect.x0 - pad).floor(), width);
        let y0 = clip((rect.y0 - pad).floor(), height);
        let x1 = clip((rect.x1 + pad).ceil(), width);
        let y1 = clip((rect.y1 + pad).ceil(), height);

        (x1 > x0 && y1 > y0).then_some(Self {
            x0,
            y0,
            x1,
            y1,
            source: candidate.source,
        })
    }

    pub fn x0(&self) -> u32 {
        self.x0
    }

    pub fn y0(&self) -> u32 {
        self.y0
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn source(&self) -> RegionSource {
        self.source
    }

    /// Whether pixel `(x, y)` is painted by this region.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }
}

/// Merge both channels' candidates into validated regions for one bitmap.
///
/// Page-space candidates are scaled by `zoom`; every candidate is padded,
/// clipped and dropped if degenerate. Overlapping regions are kept as-is:
/// painting is idempotent, so duplicates cost time but never correctness.
pub fn unify(
    candidates: impl IntoIterator<Item = CandidateRegion>,
    zoom: f32,
    padding: u32,
    width: u32,
    height: u32,
) -> Vec<SensitiveRegion> {
    let mut regions = Vec::new();
    let mut discarded = 0usize;
    for candidate in candidates {
        let candidate = candidate.into_pixel_space(zoom);
        match SensitiveRegion::from_candidate(&candidate, padding, width, height) {
            Some(region) => {
                trace!(?region, "Candidate accepted");
                regions.push(region);
            }
            None => discarded += 1,
        }
    }
    debug!(accepted = regions.len(), discarded, "Candidates unified");
    regions
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// censura-document — Detection and redaction engine for Censura.
//
// Matches configured identifiers in a page's text layer and in OCR output,
// unifies both channels' rectangles into pixel space, paints them out, and
// recompresses the page bitmap as lossy WebP or JPEG.

pub mod geometry;
pub mod image;
pub mod locate;
pub mod matcher;
pub mod ocr;
pub mod pdf;

// Re-export the primary types so callers can use `censura_document::IdentifierMatcher` etc.
pub use geometry::{CandidateRegion, CoordinateSpace, Rect, RegionSource, SensitiveRegion, unify};
pub use self::image::{EncodeSettings, EncodedImage, encode, flatten_alpha, redact};
pub use locate::{OcrLocator, TextLayerLocator};
pub use matcher::{Identifier, IdentifierMatcher};
pub use ocr::{RecognizedSpan, TextRecognizer};
pub use pdf::{DocumentLoader, PageSource, PdfiumLoader, RasterPage, TextLayer, TextRun, rasterize};

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};

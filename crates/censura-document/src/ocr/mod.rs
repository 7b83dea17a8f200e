// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition — the recognizer interface and, behind the
// `ocr` feature, the `ocrs` engine that implements it.

#[cfg(feature = "ocr")]
pub mod engine;

use censura_core::error::Result;
use image::RgbImage;

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrEngine};

/// A corner of a recognized span, in pixels.
pub type Point = (f32, f32);

/// One piece of recognized text with its location on the bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSpan {
    /// Quadrilateral around the text, in pixel space.
    pub polygon: [Point; 4],
    pub text: String,
    /// Recognizer confidence in `0.0..=1.0`, when the engine reports one.
    pub confidence: Option<f32>,
}

/// Something that turns a bitmap into recognized text spans.
///
/// Engines are expensive to build and not assumed reentrant, hence `&mut
/// self`: one instance serves one call at a time.
pub trait TextRecognizer: Send {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognizedSpan>>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognizedSpan>> {
        (**self).recognize(image)
    }
}

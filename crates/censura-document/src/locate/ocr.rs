// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR locator — keeps the recognized spans whose text contains an
// identifier. Rectangles are in pixel space.

use tracing::debug;

use crate::geometry::{CandidateRegion, Rect, RegionSource};
use crate::matcher::IdentifierMatcher;
use crate::ocr::RecognizedSpan;

/// Matches recognized text against the configured identifiers.
pub struct OcrLocator<'m> {
    matcher: &'m IdentifierMatcher,
}

impl<'m> OcrLocator<'m> {
    pub fn new(matcher: &'m IdentifierMatcher) -> Self {
        Self { matcher }
    }

    /// The bounding box of every span whose text matches, whole span.
    ///
    /// Confidence is ignored: a low-confidence hit is still redacted.
    pub fn candidates(&self, spans: &[RecognizedSpan]) -> Vec<CandidateRegion> {
        let candidates: Vec<CandidateRegion> = spans
            .iter()
            .filter(|span| self.matcher.is_match(&span.text))
            .filter_map(|span| Rect::bounding(&span.polygon))
            .map(|rect| CandidateRegion::pixel(rect, RegionSource::Ocr))
            .collect();
        debug!(spans = spans.len(), found = candidates.len(), "OCR spans matched");
        candidates
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The seam between the detection engine and a concrete PDF backend.

use std::path::Path;

use censura_core::error::Result;
use image::DynamicImage;

use crate::geometry::Rect;

/// A run of embedded text with its bounds in page space: points, with the
/// top-left origin of the page as it is rendered.
///
/// `glyphs`, when the backend knows them, holds one box per char of `text`.
/// Chars without ink (generated spaces, line breaks) have zero-area boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
    pub glyphs: Vec<Rect>,
}

impl TextRun {
    /// A run known only by its overall box.
    pub fn new(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            rect,
            glyphs: Vec::new(),
        }
    }

    /// A run assembled char by char. Its box is the union of the inked
    /// glyphs.
    pub fn from_glyphs(chars: impl IntoIterator<Item = (char, Rect)>) -> Self {
        let mut text = String::new();
        let mut glyphs = Vec::new();
        let mut rect: Option<Rect> = None;
        for (c, glyph) in chars {
            text.push(c);
            glyphs.push(glyph);
            if glyph.has_area() {
                rect = Some(rect.map_or(glyph, |r| r.union(glyph)));
            }
        }
        Self {
            text,
            rect: rect.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0)),
            glyphs,
        }
    }

    /// Per-char boxes, when there is exactly one for every char.
    pub fn glyph_boxes(&self) -> Option<&[Rect]> {
        (!self.glyphs.is_empty() && self.glyphs.len() == self.text.chars().count())
            .then_some(self.glyphs.as_slice())
    }
}

/// A page's selectable text. Empty for pure scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayer {
    runs: Vec<TextRun>,
}

impl TextLayer {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// True when there is no non-whitespace text at all.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.trim().is_empty())
    }
}

/// One open document, page by page.
///
/// Implementations need not be `Send`: the pipeline keeps a source on a
/// single worker thread for its whole life.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) at `zoom` pixels per page unit.
    fn render(&self, index: usize, zoom: f32) -> Result<DynamicImage>;

    /// Extract the embedded text of page `index`.
    fn text_layer(&self, index: usize) -> Result<TextLayer>;
}

/// Opens documents from disk.
pub trait DocumentLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_layer_is_empty() {
        let layer = TextLayer::new(vec![TextRun::new(
            " \n\t",
            Rect::new(0.0, 0.0, 10.0, 10.0),
        )]);
        assert!(layer.is_empty());
        assert!(TextLayer::default().is_empty());
    }

    #[test]
    fn glyph_run_is_bounded_by_its_inked_chars() {
        let run = TextRun::from_glyphs([
            ('4', Rect::new(10.0, 5.0, 16.0, 15.0)),
            (' ', Rect::new(16.0, 10.0, 16.0, 10.0)),
            ('2', Rect::new(19.0, 4.0, 25.0, 15.0)),
        ]);
        assert_eq!(run.text, "4 2");
        assert_eq!(run.rect, Rect::new(10.0, 4.0, 25.0, 15.0));
        assert_eq!(run.glyph_boxes().map(<[Rect]>::len), Some(3));
    }

    #[test]
    fn run_without_glyphs_has_no_glyph_boxes() {
        let run = TextRun::new("42", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(run.glyph_boxes().is_none());
    }

    #[test]
    fn layer_with_text_is_not_empty() {
        let layer = TextLayer::new(vec![TextRun::new("CC", Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert!(!layer.is_empty());
        assert_eq!(layer.runs().len(), 1);
    }
}

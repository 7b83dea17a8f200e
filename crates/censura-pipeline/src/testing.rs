// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory documents and a deterministic recognizer for pipeline tests.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use censura_core::config::CensuraConfig;
use censura_core::error::{CensuraError, Result};
use censura_document::pdf::{PageSource, TextLayer};
use censura_document::{
    DocumentLoader, Identifier, IdentifierMatcher, Rect, RecognizedSpan, TextRecognizer, TextRun,
};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

pub fn matcher(values: &[&str]) -> IdentifierMatcher {
    let grouping = CensuraConfig::default().grouping;
    IdentifierMatcher::new(
        values
            .iter()
            .map(|v| Identifier::new(v, &grouping).expect("valid identifier"))
            .collect(),
    )
}

/// A synthetic page: transparent background, optional text layer, and
/// black "ink" blocks standing in for printed glyphs.
#[derive(Debug, Clone)]
pub struct FakePage {
    /// Page size in points.
    pub size: (f32, f32),
    pub text: Vec<TextRun>,
    /// Ink blocks in points.
    pub ink: Vec<Rect>,
    pub fail_render: bool,
    pub fail_text: bool,
}

impl FakePage {
    pub fn blank() -> Self {
        Self {
            size: (200.0, 100.0),
            text: Vec::new(),
            ink: Vec::new(),
            fail_render: false,
            fail_text: false,
        }
    }

    pub fn with_text(mut self, run: TextRun) -> Self {
        self.text.push(run);
        self
    }

    pub fn with_ink(mut self, rect: Rect) -> Self {
        self.ink.push(rect);
        self
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeDocument {
    pages: Vec<FakePage>,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self { pages }
    }

    fn page(&self, index: usize) -> Result<&FakePage> {
        self.pages
            .get(index)
            .ok_or_else(|| CensuraError::Render(format!("no page {index}")))
    }
}

impl PageSource for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, index: usize, zoom: f32) -> Result<DynamicImage> {
        let page = self.page(index)?;
        if page.fail_render {
            return Err(CensuraError::Render(format!("page {index} is corrupt")));
        }
        let width = (page.size.0 * zoom).round() as u32;
        let height = (page.size.1 * zoom).round() as u32;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        for ink in &page.ink {
            let ink = ink.scaled(zoom);
            for (x, y, pixel) in canvas.enumerate_pixels_mut() {
                let (fx, fy) = (x as f32, y as f32);
                if fx >= ink.x0 && fx < ink.x1 && fy >= ink.y0 && fy < ink.y1 {
                    *pixel = Rgba([0, 0, 0, 255]);
                }
            }
        }
        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn text_layer(&self, index: usize) -> Result<TextLayer> {
        let page = self.page(index)?;
        if page.fail_text {
            return Err(CensuraError::TextExtraction("broken content stream".into()));
        }
        Ok(TextLayer::new(page.text.clone()))
    }
}

/// Serves [`FakeDocument`]s by file name.
#[derive(Debug, Clone, Default)]
pub struct FakeLoader {
    documents: HashMap<String, FakeDocument>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, document: FakeDocument) -> Self {
        self.documents.insert(file_name.to_owned(), document);
        self
    }
}

impl DocumentLoader for FakeLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.documents
            .get(&name)
            .cloned()
            .map(|document| Box::new(document) as Box<dyn PageSource + 'a>)
            .ok_or_else(|| CensuraError::Document(format!("{name} is not a readable PDF")))
    }
}

/// "Reads" every dark block on the bitmap as one line of `text`.
pub struct InkReader {
    pub text: String,
    pub delay: Duration,
}

impl InkReader {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            text: text.into(),
            delay,
        }
    }
}

impl TextRecognizer for InkReader {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognizedSpan>> {
        std::thread::sleep(self.delay);
        let dark: Vec<(f32, f32)> = image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0[0] < 128)
            .flat_map(|(x, y, _)| {
                let (x, y) = (x as f32, y as f32);
                [(x, y), (x + 1.0, y + 1.0)]
            })
            .collect();
        let Some(bounds) = Rect::bounding(&dark) else {
            return Ok(Vec::new());
        };
        Ok(vec![RecognizedSpan {
            polygon: [
                (bounds.x0, bounds.y0),
                (bounds.x1, bounds.y0),
                (bounds.x1, bounds.y1),
                (bounds.x0, bounds.y1),
            ],
            text: self.text.clone(),
            confidence: Some(0.35),
        }])
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF backend built on `pdfium-render`: page rendering and text-layer
// extraction.
//
// The pdfium shared library is looked up next to the executable first and
// then on the system library path. pdfium objects are not `Send`; keep a
// `PdfiumLoader` and everything it opens on one thread.

use std::path::{Path, PathBuf};

use censura_core::error::{CensuraError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use crate::geometry::Rect;
use crate::pdf::source::{DocumentLoader, PageSource, TextLayer, TextRun};

/// Owns the bound pdfium library and opens documents with it.
pub struct PdfiumLoader {
    pdfium: Pdfium,
}

impl PdfiumLoader {
    /// Bind pdfium from `./` or, failing that, from the system library path.
    pub fn new() -> Result<Self> {
        Self::with_library_dir(".")
    }

    /// Bind pdfium from `dir`, falling back to the system library path.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn with_library_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let local: PathBuf = Pdfium::pdfium_platform_library_name_at_path(dir.as_ref());
        let bindings = Pdfium::bind_to_library(&local)
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                CensuraError::Startup(format!(
                    "could not load the pdfium library from {} or the system path: {}",
                    local.display(),
                    err
                ))
            })?;
        info!("pdfium library bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl DocumentLoader for PdfiumLoader {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>> {
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            CensuraError::Document(format!("failed to open {}: {}", path.display(), err))
        })?;
        debug!(pages = document.pages().len(), "PDF loaded");
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// An open pdfium document.
struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> std::result::Result<PdfPage<'_>, String> {
        let page_index = index
            .try_into()
            .map_err(|_| format!("page index {index} exceeds the pdfium page range"))?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|err| format!("cannot load page {index}: {err}"))
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render(&self, index: usize, zoom: f32) -> Result<DynamicImage> {
        let page = self.page(index).map_err(CensuraError::Render)?;
        let bitmap = page
            .render_with_config(&render_config(zoom))
            .map_err(|err| CensuraError::Render(format!("page {index}: {err}")))?;
        Ok(bitmap.as_image())
    }

    /// The whole page as one run with a box per char, so identifiers split
    /// across pdfium segments or lines are still found.
    fn text_layer(&self, index: usize) -> Result<TextLayer> {
        let page = self.page(index).map_err(CensuraError::TextExtraction)?;
        let text = page
            .text()
            .map_err(|err| CensuraError::TextExtraction(format!("page {index}: {err}")))?;

        // Char boxes are in unrotated PDF user space. Map them the way the
        // bitmap is rendered (rotation, crop box origin, flip), at a fixed
        // scale, and divide back out to get displayed page points.
        let mapping = render_config(MAPPING_SCALE);
        let to_page = |x: f32, y: f32| {
            page.points_to_pixels(PdfPoints::new(x), PdfPoints::new(y), &mapping)
                .ok()
                .map(|(px, py)| (px as f32 / MAPPING_SCALE, py as f32 / MAPPING_SCALE))
        };

        let mut chars = Vec::new();
        let mut unplaced = 0usize;
        for text_char in text.chars().iter() {
            let Some(c) = text_char.unicode_char() else {
                continue;
            };
            let glyph = text_char
                .loose_bounds()
                .ok()
                .and_then(|b| {
                    display_rect(
                        (b.left().value, b.bottom().value),
                        (b.right().value, b.top().value),
                        &to_page,
                    )
                })
                .unwrap_or_else(|| {
                    unplaced += 1;
                    NO_INK
                });
            chars.push((c, glyph));
        }

        let run = TextRun::from_glyphs(chars);
        debug!(index, chars = run.glyphs.len(), unplaced, "Text layer extracted");
        if run.text.trim().is_empty() {
            return Ok(TextLayer::default());
        }
        Ok(TextLayer::new(vec![run]))
    }
}

/// Scale at which char boxes are mapped to the page; pdfium rounds device
/// coordinates to whole pixels, so this bounds the error to 1/8 pt.
const MAPPING_SCALE: f32 = 8.0;

const NO_INK: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 0.0,
    y1: 0.0,
};

fn render_config(scale: f32) -> PdfRenderConfig {
    PdfRenderConfig::new().scale_page_by_factor(scale)
}

/// Axis-aligned box of a user-space rectangle given as its bottom-left and
/// top-right corners, after mapping every corner through `to_page`. All
/// four corners are mapped since a rotated page swaps which ones are
/// extreme.
fn display_rect(
    (left, bottom): (f32, f32),
    (right, top): (f32, f32),
    to_page: impl Fn(f32, f32) -> Option<(f32, f32)>,
) -> Option<Rect> {
    let corners = [(left, bottom), (left, top), (right, top), (right, bottom)];
    let mapped = corners
        .iter()
        .map(|&(x, y)| to_page(x, y))
        .collect::<Option<Vec<_>>>()?;
    Rect::bounding(&mapped)
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-layer locator — finds identifiers in a page's embedded text and
// reports their rectangles, already scaled into pixel space.
//
// An occurrence's box is the union of its glyph boxes, one box per text line
// it spans. Runs without per-char geometry fall back to spreading the run's
// box evenly over its chars.

use censura_core::error::CensuraError;
use tracing::{debug, instrument, warn};

use crate::geometry::{CandidateRegion, Rect, RegionSource};
use crate::matcher::{IdentifierMatcher, normalize};
use crate::pdf::source::{PageSource, TextLayer, TextRun};

/// Searches embedded page text for the configured identifiers.
pub struct TextLayerLocator<'m> {
    matcher: &'m IdentifierMatcher,
}

impl<'m> TextLayerLocator<'m> {
    pub fn new(matcher: &'m IdentifierMatcher) -> Self {
        Self { matcher }
    }

    /// Extract page `index`'s text layer and search it.
    ///
    /// A missing text layer (pure scans) or an extraction failure yields an
    /// empty list; failures are logged, never propagated.
    #[instrument(skip(self, source))]
    pub fn locate(&self, source: &dyn PageSource, index: usize, zoom: f32) -> Vec<CandidateRegion> {
        match source.text_layer(index) {
            Ok(layer) if layer.is_empty() => {
                debug!("No text layer; relying on OCR");
                Vec::new()
            }
            Ok(layer) => self.search(&layer, zoom),
            Err(err) => {
                let err = match err {
                    CensuraError::TextExtraction(_) => err,
                    other => CensuraError::TextExtraction(other.to_string()),
                };
                warn!(page = index, error = %err, "Text layer search failed; treating as no match");
                Vec::new()
            }
        }
    }

    /// Find every occurrence in an already-extracted layer.
    ///
    /// Looks for each literal search term (raw, normalized, formatted
    /// variants) and, additionally, for the normalized identifier with any
    /// separators interleaved, e.g. `1 016-071.566` or a number wrapped onto
    /// the next line.
    pub fn search(&self, layer: &TextLayer, zoom: f32) -> Vec<CandidateRegion> {
        let terms = self.matcher.search_terms();
        let mut candidates = Vec::new();

        for run in layer.runs() {
            let mut ranges: Vec<(usize, usize)> = Vec::new();
            for term in &terms {
                for range in literal_ranges(&run.text, term) {
                    if !ranges.contains(&range) {
                        ranges.push(range);
                    }
                }
            }
            for identifier in self.matcher.identifiers() {
                for range in separated_ranges(&run.text, identifier.normalized()) {
                    if !ranges.contains(&range) {
                        ranges.push(range);
                    }
                }
            }
            for (start, end) in ranges {
                candidates.extend(occurrence_rects(run, start, end).into_iter().map(|rect| {
                    CandidateRegion::page(rect, RegionSource::TextLayer).into_pixel_space(zoom)
                }));
            }
        }

        debug!(found = candidates.len(), "Text layer searched");
        candidates
    }
}

/// Char ranges of every non-overlapping literal occurrence of `term`.
fn literal_ranges<'a>(text: &'a str, term: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    let term_chars = term.chars().count();
    text.match_indices(term).map(move |(byte, _)| {
        let start = text[..byte].chars().count();
        (start, start + term_chars)
    })
}

/// Char ranges where `normalized` occurs once separators are ignored.
fn separated_ranges(text: &str, normalized: &str) -> Vec<(usize, usize)> {
    let kept: Vec<usize> = text
        .chars()
        .enumerate()
        .filter(|(_, c)| !matches!(c, '.' | '-') && !c.is_whitespace())
        .map(|(i, _)| i)
        .collect();
    let stripped = normalize(text);
    let len = normalized.chars().count();
    if len == 0 {
        return Vec::new();
    }

    stripped
        .match_indices(normalized)
        .map(|(byte, _)| {
            let first = stripped[..byte].chars().count();
            (kept[first], kept[first + len - 1] + 1)
        })
        .collect()
}

/// Page-space boxes covering chars `start..end` of `run`.
fn occurrence_rects(run: &TextRun, start: usize, end: usize) -> Vec<Rect> {
    let lines = run
        .glyph_boxes()
        .map(|glyphs| line_boxes(glyphs[start..end].iter().copied().filter(Rect::has_area)))
        .unwrap_or_default();
    if lines.is_empty() {
        vec![interpolated(run, start, end)]
    } else {
        lines
    }
}

/// Grow one box per text line from consecutive inked glyphs. A glyph that
/// does not vertically overlap the current box by at least half its height
/// starts a new one.
fn line_boxes(glyphs: impl Iterator<Item = Rect>) -> Vec<Rect> {
    let mut lines: Vec<Rect> = Vec::new();
    for glyph in glyphs {
        match lines.last_mut() {
            Some(line) if shares_line(line, &glyph) => *line = line.union(glyph),
            _ => lines.push(glyph),
        }
    }
    lines
}

fn shares_line(line: &Rect, glyph: &Rect) -> bool {
    let overlap = line.y1.min(glyph.y1) - line.y0.max(glyph.y0);
    overlap >= 0.5 * glyph.height().min(line.height())
}

/// Portion of a run's box covering chars `start..end`, assuming even advance.
fn interpolated(run: &TextRun, start: usize, end: usize) -> Rect {
    let total = run.text.chars().count().max(1) as f32;
    let rect = run.rect.normalized();
    let advance = rect.width() / total;
    Rect::new(
        rect.x0 + advance * start as f32,
        rect.y0,
        rect.x0 + advance * end as f32,
        rect.y1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CoordinateSpace, unify};
    use crate::matcher::Identifier;
    use censura_core::config::CensuraConfig;
    use censura_core::error::Result;
    use image::DynamicImage;

    fn matcher(values: &[&str]) -> IdentifierMatcher {
        let grouping = CensuraConfig::default().grouping;
        IdentifierMatcher::new(
            values
                .iter()
                .map(|v| Identifier::new(v, &grouping).expect("valid"))
                .collect(),
        )
    }

    fn layer(text: &str, rect: Rect) -> TextLayer {
        TextLayer::new(vec![TextRun::new(text, rect)])
    }

    /// Proportional advance widths, roughly Helvetica at 10pt.
    fn advance(c: char) -> f32 {
        match c {
            'C' => 7.2,
            'l' | 'i' => 2.2,
            'r' => 3.3,
            ':' | ' ' | '.' => 2.8,
            _ => 5.6,
        }
    }

    /// Lay `lines` out top to bottom, 12pt apart, with a zero-area box for
    /// every line break.
    fn typeset(lines: &[&str]) -> TextRun {
        let mut chars = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            let top = 100.0 + row as f32 * 12.0;
            let mut x = 50.0;
            if row > 0 {
                chars.push(('\n', Rect::new(x, top, x, top)));
            }
            for c in line.chars() {
                chars.push((c, Rect::new(x, top, x + advance(c), top + 10.0)));
                x += advance(c);
            }
        }
        TextRun::from_glyphs(chars)
    }

    struct FixedSource(std::result::Result<TextLayer, String>);

    impl PageSource for FixedSource {
        fn page_count(&self) -> usize {
            1
        }

        fn render(&self, _index: usize, _zoom: f32) -> Result<DynamicImage> {
            Ok(DynamicImage::new_rgb8(1, 1))
        }

        fn text_layer(&self, _index: usize) -> Result<TextLayer> {
            self.0.clone().map_err(CensuraError::TextExtraction)
        }
    }

    #[test]
    fn formatted_national_id_is_found_and_scaled() {
        let m = matcher(&["1016071566"]);
        // "CC: " is 4 chars, the variant 13 chars; 17 chars over 170 points.
        let layer = layer("CC: 1.016.071.566", Rect::new(100.0, 200.0, 270.0, 212.0));
        let zoom = 150.0 / 72.0;
        let found = TextLayerLocator::new(&m).search(&layer, zoom);

        assert_eq!(found.len(), 1);
        let candidate = found[0];
        assert_eq!(candidate.space, CoordinateSpace::Pixel);
        assert_eq!(candidate.source, RegionSource::TextLayer);
        assert!((candidate.rect.x0 - 140.0 * zoom).abs() < 1e-2);
        assert!((candidate.rect.x1 - 270.0 * zoom).abs() < 1e-2);
        assert!((candidate.rect.y0 - 200.0 * zoom).abs() < 1e-2);
        assert!((candidate.rect.y1 - 212.0 * zoom).abs() < 1e-2);
    }

    #[test]
    fn raw_digits_are_found() {
        let m = matcher(&["3022538972"]);
        let layer = layer("Tel 3022538972", Rect::new(0.0, 0.0, 140.0, 10.0));
        let found = TextLayerLocator::new(&m).search(&layer, 1.0);
        assert_eq!(found.len(), 1);
        assert!((found[0].rect.x0 - 40.0).abs() < 1e-3);
        assert!((found[0].rect.x1 - 140.0).abs() < 1e-3);
    }

    #[test]
    fn separators_anywhere_are_tolerated() {
        let m = matcher(&["3022538972"]);
        let layer = layer("Cel: 302-253 8972.", Rect::new(0.0, 0.0, 180.0, 10.0));
        let found = TextLayerLocator::new(&m).search(&layer, 1.0);
        assert_eq!(found.len(), 1);
        // chars 5..17 of 18
        assert!((found[0].rect.x0 - 50.0).abs() < 1e-3);
        assert!((found[0].rect.x1 - 170.0).abs() < 1e-3);
    }

    #[test]
    fn every_occurrence_is_reported() {
        let m = matcher(&["94120210445"]);
        let layer = TextLayer::new(vec![
            TextRun::new("94120210445 / 94.120.210.445", Rect::new(0.0, 0.0, 280.0, 10.0)),
            TextRun::new("ref 94120210445", Rect::new(0.0, 20.0, 150.0, 30.0)),
        ]);
        let found = TextLayerLocator::new(&m).search(&layer, 2.0);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        let m = matcher(&["1016071566", "3022538972"]);
        let layer = layer("Invoice 2024-118, total 99.50", Rect::new(0.0, 0.0, 300.0, 12.0));
        assert!(TextLayerLocator::new(&m).search(&layer, 2.0).is_empty());
    }

    #[test]
    fn empty_text_layer_yields_nothing() {
        let m = matcher(&["1016071566"]);
        let source = FixedSource(Ok(TextLayer::default()));
        assert!(TextLayerLocator::new(&m).locate(&source, 0, 2.0).is_empty());
    }

    #[test]
    fn extraction_failure_is_recovered() {
        let m = matcher(&["1016071566"]);
        let source = FixedSource(Err("damaged content stream".into()));
        assert!(TextLayerLocator::new(&m).locate(&source, 0, 2.0).is_empty());
    }

    #[test]
    fn locate_reads_layer_from_source() {
        let m = matcher(&["1016071566"]);
        let source = FixedSource(Ok(layer("1016071566", Rect::new(10.0, 10.0, 110.0, 20.0))));
        let found = TextLayerLocator::new(&m).locate(&source, 0, 3.0);
        assert_eq!(found.len(), 1);
        assert!((found[0].rect.x0 - 30.0).abs() < 1e-3);
        assert!((found[0].rect.y1 - 60.0).abs() < 1e-3);
    }

    #[test]
    fn proportional_glyphs_bound_the_digits_exactly() {
        let m = matcher(&["3022538972"]);
        let run = typeset(&["Celular: 3022538972"]);
        // "Celular: " advances 37.3pt; ten digits take 56pt more.
        let (digits_start, digits_end) = (50.0 + 37.3, 50.0 + 37.3 + 56.0);
        let zoom = 150.0 / 72.0;

        let found = TextLayerLocator::new(&m).search(&TextLayer::new(vec![run]), zoom);

        assert_eq!(found.len(), 1);
        assert!((found[0].rect.x0 - digits_start * zoom).abs() < 1e-2);
        assert!((found[0].rect.x1 - digits_end * zoom).abs() < 1e-2);
        assert!((found[0].rect.y0 - 100.0 * zoom).abs() < 1e-2);

        let regions = unify(found, zoom, 5, 1275, 1650);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].x0() as f32 <= digits_start * zoom);
        assert!(regions[0].x1() as f32 >= digits_end * zoom);
    }

    #[test]
    fn number_wrapped_across_lines_gets_a_box_per_line() {
        let m = matcher(&["3022538972"]);
        let run = typeset(&["Cel 302 253", "8972 ok"]);

        let found = TextLayerLocator::new(&m).search(&TextLayer::new(vec![run]), 1.0);

        assert_eq!(found.len(), 2);
        let (first, second) = (found[0].rect, found[1].rect);
        // "Cel " advances 7.2 + 5.6 + 2.2 + 2.8.
        assert!((first.x0 - (50.0 + 17.8)).abs() < 1e-3);
        assert!((first.y0 - 100.0).abs() < 1e-3 && (first.y1 - 110.0).abs() < 1e-3);
        assert!((second.x0 - 50.0).abs() < 1e-3);
        assert!((second.x1 - (50.0 + 4.0 * 5.6)).abs() < 1e-3);
        assert!((second.y0 - 112.0).abs() < 1e-3);
    }

    #[test]
    fn run_without_inked_glyphs_falls_back_to_its_box() {
        let m = matcher(&["1016071566"]);
        let blank = Rect::new(0.0, 0.0, 0.0, 0.0);
        let mut run = TextRun::from_glyphs("1016071566".chars().map(|c| (c, blank)));
        run.rect = Rect::new(0.0, 0.0, 100.0, 10.0);

        let found = TextLayerLocator::new(&m).search(&TextLayer::new(vec![run]), 1.0);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(0.0, 0.0, 100.0, 10.0));
    }

    #[test]
    fn separated_ranges_map_back_to_original_chars() {
        assert_eq!(separated_ranges("a 1.2-3 b", "123"), vec![(2, 7)]);
        assert_eq!(separated_ranges("123 123", "123"), vec![(0, 3), (4, 7)]);
        assert!(separated_ranges("12", "123").is_empty());
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-page hot path in censura-document:
// painting regions and recompressing a page-sized bitmap.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use censura_core::OutputFormat;
use censura_document::{CandidateRegion, EncodeSettings, Rect, RegionSource, encode, redact, unify};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A Letter page at 150 DPI: light background with dark "text" stripes.
fn letter_page() -> DynamicImage {
    let (width, height) = (1275u32, 1650u32);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if y % 40 < 12 && x % 9 < 6 && (100..1175).contains(&x) {
            Rgb([25, 25, 30])
        } else {
            Rgb([248, 248, 244])
        }
    }))
}

fn candidates() -> Vec<CandidateRegion> {
    vec![
        CandidateRegion::page(Rect::new(120.0, 90.0, 260.0, 102.0), RegionSource::TextLayer),
        CandidateRegion::pixel(Rect::new(400.0, 900.0, 720.0, 940.0), RegionSource::Ocr),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Unify and paint two regions on a Letter page.
fn bench_redaction(c: &mut Criterion) {
    let page = letter_page();
    let zoom = 150.0 / 72.0;

    c.bench_function("redact (1275x1650, 2 regions)", |b| {
        b.iter(|| {
            let regions = unify(black_box(candidates()), zoom, 5, page.width(), page.height());
            black_box(redact(black_box(&page), &regions).into_owned());
        });
    });
}

/// Lossy WebP at the default quality, the dominant per-page cost.
fn bench_webp_encoding(c: &mut Criterion) {
    let page = letter_page();
    let settings = EncodeSettings {
        format: OutputFormat::WebP,
        quality: 75,
    };

    c.bench_function("encode webp q75 (1275x1650)", |b| {
        b.iter(|| {
            let encoded = encode(black_box(&page), settings).expect("encodes");
            black_box(encoded.size());
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_redaction, bench_webp_encoding
}
criterion_main!(benches);

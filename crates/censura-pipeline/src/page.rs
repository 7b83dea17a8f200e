// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page processor — takes a rendered page through OCR, unification,
// redaction and encoding, and writes the result.

use std::path::PathBuf;
use std::sync::Arc;

use censura_core::config::CensuraConfig;
use censura_core::error::{CensuraError, Result};
use censura_core::types::{PageOutcome, PageResult, PageStage, page_file_name};
use censura_document::{
    CandidateRegion, EncodeSettings, IdentifierMatcher, OcrLocator, encode, redact, unify,
};
use image::{DynamicImage, RgbImage};
use tracing::{error, info, instrument, trace, warn};

use crate::ocr_service::OcrHandle;
use crate::render::RenderedPage;

/// Tracks a page through its [`PageStage`]s.
struct StageTracker {
    index: usize,
    stage: PageStage,
}

impl StageTracker {
    fn rendered(index: usize) -> Self {
        Self {
            index,
            stage: PageStage::Rendered,
        }
    }

    fn advance(&mut self, next: PageStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal page transition {:?} -> {:?}",
            self.stage,
            next
        );
        trace!(page = self.index, from = ?self.stage, to = ?next, "Page stage");
        self.stage = next;
    }
}

/// Per-page work shared by every page task of a run.
pub struct PageProcessor {
    matcher: Arc<IdentifierMatcher>,
    ocr: Option<OcrHandle>,
    padding: u32,
    encoding: EncodeSettings,
    output_dir: PathBuf,
}

impl PageProcessor {
    pub fn new(config: &CensuraConfig, matcher: Arc<IdentifierMatcher>, ocr: Option<OcrHandle>) -> Self {
        Self {
            matcher,
            ocr,
            padding: config.padding,
            encoding: EncodeSettings {
                format: config.format,
                quality: config.quality,
            },
            output_dir: config.output_dir.clone(),
        }
    }

    /// Output file name for page `index` of the document with `stem`.
    pub fn file_name(&self, stem: &str, index: usize) -> String {
        page_file_name(stem, index, self.encoding.format.extension())
    }

    /// Process one rendered page. Never fails: errors become a
    /// [`PageOutcome::Failed`] result.
    #[instrument(skip(self, page), fields(page = page.index))]
    pub async fn process(&self, stem: &str, page: RenderedPage) -> PageResult {
        let index = page.index;
        let file_name = self.file_name(stem, index);
        let mut stage = StageTracker::rendered(index);

        match self.run(&mut stage, &file_name, page).await {
            Ok(result) => result,
            Err(err) => {
                stage.advance(PageStage::Failed);
                error!(page = index, file = %file_name, error = %err, "Page failed");
                PageResult::failed(index, file_name, err.to_string())
            }
        }
    }

    async fn run(
        &self,
        stage: &mut StageTracker,
        file_name: &str,
        page: RenderedPage,
    ) -> Result<PageResult> {
        let RenderedPage {
            index,
            raster,
            text_candidates,
        } = page;
        let zoom = raster.zoom;
        let bitmap = Arc::new(raster.image.into_rgb8());
        let (width, height) = bitmap.dimensions();

        let ocr_candidates = self.ocr_candidates(Arc::clone(&bitmap)).await;
        let regions = unify(
            text_candidates.into_iter().chain(ocr_candidates),
            zoom,
            self.padding,
            width,
            height,
        );
        stage.advance(PageStage::Analyzed);

        let region_count = regions.len();
        let settings = self.encoding;
        // A timed-out OCR call may still hold a reference; copy only then.
        let bitmap = Arc::unwrap_or_clone(bitmap);
        let encoded = tokio::task::spawn_blocking(move || {
            let image = DynamicImage::ImageRgb8(bitmap);
            let redacted = redact(&image, &regions);
            encode(&redacted, settings)
        })
        .await
        .map_err(|err| CensuraError::Encode(format!("encoder task failed: {err}")))??;

        let outcome = if region_count > 0 {
            stage.advance(PageStage::Redacted);
            PageOutcome::Redacted
        } else {
            stage.advance(PageStage::Clean);
            PageOutcome::Clean
        };

        tokio::fs::write(self.output_dir.join(file_name), &encoded.bytes).await?;
        stage.advance(PageStage::Encoded);

        info!(
            file = %file_name,
            size_kib = format!("{:.1}", encoded.size() as f64 / 1024.0),
            regions = region_count,
            "Page written"
        );
        Ok(PageResult {
            index,
            file_name: file_name.to_owned(),
            encoded_bytes: encoded.size() as u64,
            regions: region_count,
            outcome,
        })
    }

    async fn ocr_candidates(&self, bitmap: Arc<RgbImage>) -> Vec<CandidateRegion> {
        let Some(ocr) = &self.ocr else {
            return Vec::new();
        };
        match ocr.recognize(bitmap).await {
            Ok(spans) => OcrLocator::new(&self.matcher).candidates(&spans),
            Err(err) => {
                warn!(error = %err, "OCR channel failed; treating as no match");
                Vec::new()
            }
        }
    }
}

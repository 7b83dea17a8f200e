// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch processor — discovers input documents, owns the run's workers, and
// aggregates every document's report into the run summary.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use censura_core::config::CensuraConfig;
use censura_core::error::{CensuraError, Result};
use censura_core::types::{BatchOutcome, BatchSummary};
use censura_document::{IdentifierMatcher, TextRecognizer};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::document::DocumentProcessor;
use crate::ocr_service::OcrService;
use crate::page::PageProcessor;
use crate::render::{LoaderFactory, RenderWorker};

/// Name of the JSON run report written into the output directory.
pub const REPORT_FILE_NAME: &str = "censura-report.json";

/// Builds `n` recognizer instances, one per OCR worker.
pub type RecognizerFactory = Box<dyn FnOnce(usize) -> Result<Vec<Box<dyn TextRecognizer>>> + Send>;

/// The external engines a run needs, built lazily so that guided exits never
/// pay for loading them.
pub struct Backends {
    pub loader: LoaderFactory,
    /// `None` when the binary was built without an OCR engine.
    pub recognizers: Option<RecognizerFactory>,
}

/// PDF files directly inside `dir`, sorted by name. The extension check is
/// case-insensitive.
pub async fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().await?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    debug!(count = found.len(), dir = %dir.display(), "Documents discovered");
    Ok(found)
}

/// Number of pages processed at once, and the render queue depth.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Runs a whole batch against one validated configuration.
pub struct BatchProcessor {
    config: CensuraConfig,
    matcher: Arc<IdentifierMatcher>,
    parallelism: usize,
}

impl BatchProcessor {
    /// Validate `config` and build the identifier set.
    pub fn new(config: CensuraConfig) -> Result<Self> {
        config.validate()?;
        let matcher = Arc::new(IdentifierMatcher::from_config(&config)?);
        Ok(Self {
            config,
            matcher,
            parallelism: default_parallelism(),
        })
    }

    /// Override the page-level parallelism (at least 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn config(&self) -> &CensuraConfig {
        &self.config
    }

    pub fn matcher(&self) -> &IdentifierMatcher {
        &self.matcher
    }

    /// Process every document in the input directory.
    ///
    /// Only startup failures (backend or OCR engine initialisation, an
    /// unusable input or output directory) are returned as errors; document
    /// and page failures are recorded in the summary.
    #[instrument(skip_all, fields(input = %self.config.input_dir.display()))]
    pub async fn run(&self, backends: Backends) -> Result<BatchOutcome> {
        let input_dir = &self.config.input_dir;
        if !tokio::fs::try_exists(input_dir).await? {
            tokio::fs::create_dir_all(input_dir).await?;
            info!(
                "Created input directory {}; put the PDF files to process there and run again",
                input_dir.display()
            );
            return Ok(BatchOutcome::InputDirCreated(input_dir.clone()));
        }

        let documents = discover_documents(input_dir).await?;
        if documents.is_empty() {
            info!("No PDF files found in {}", input_dir.display());
            return Ok(BatchOutcome::NothingToDo);
        }
        info!(documents = documents.len(), "Starting batch");

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let renderer = RenderWorker::start(
            backends.loader,
            Arc::clone(&self.matcher),
            self.config.dpi,
            self.parallelism,
        )
        .await?;
        let ocr = match self.start_ocr(backends.recognizers).await {
            Ok(ocr) => ocr,
            Err(err) => {
                stop(renderer, None).await;
                return Err(err);
            }
        };

        let started_at = Utc::now();
        let pages = Arc::new(PageProcessor::new(
            &self.config,
            Arc::clone(&self.matcher),
            ocr.as_ref().map(OcrService::handle),
        ));
        let processor = DocumentProcessor::new(renderer.handle(), pages, self.parallelism);

        let mut reports = Vec::with_capacity(documents.len());
        for path in &documents {
            reports.push(processor.process(path).await);
        }
        drop(processor);
        stop(renderer, ocr).await;

        let summary = BatchSummary {
            started_at,
            finished_at: Utc::now(),
            output_dir: self.config.output_dir.clone(),
            documents: reports,
        };
        if let Err(err) = write_report(&summary).await {
            warn!(error = %err, "Could not write run report");
        }

        info!(
            documents = summary.documents.len(),
            failed = summary.documents_failed(),
            pages = summary.pages_written(),
            redacted = summary.pages_redacted(),
            output = %summary.output_dir.display(),
            "Batch complete"
        );
        Ok(BatchOutcome::Completed(summary))
    }

    async fn start_ocr(&self, factory: Option<RecognizerFactory>) -> Result<Option<OcrService>> {
        if !self.config.ocr.enabled {
            info!("OCR disabled; only text layers are searched");
            return Ok(None);
        }
        let Some(factory) = factory else {
            warn!("No OCR engine available; only text layers are searched");
            return Ok(None);
        };

        let workers = self.config.ocr.workers;
        // Model loading is slow and blocking.
        let recognizers = tokio::task::spawn_blocking(move || factory(workers))
            .await
            .map_err(|err| CensuraError::Startup(format!("OCR engine loader failed: {err}")))??;
        OcrService::start(recognizers, self.config.ocr.timeout()).map(Some)
    }
}

/// Write `summary` as pretty JSON into its output directory.
async fn write_report(summary: &BatchSummary) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    let path = summary.output_dir.join(REPORT_FILE_NAME);
    tokio::fs::write(&path, json).await?;
    debug!(path = %path.display(), "Run report written");
    Ok(())
}

/// Join the worker threads off the async executor.
async fn stop(renderer: RenderWorker, ocr: Option<OcrService>) {
    let joined = tokio::task::spawn_blocking(move || {
        if let Some(ocr) = ocr {
            ocr.shutdown();
        }
        renderer.shutdown();
    })
    .await;
    if let Err(err) = joined {
        warn!(error = %err, "Worker shutdown did not complete cleanly");
    }
}

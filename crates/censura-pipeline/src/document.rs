// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document processor — fans a document's pages out to page tasks.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use censura_core::error::{CensuraError, Result};
use censura_core::types::{DocumentReport, PageResult};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, instrument};

use crate::page::PageProcessor;
use crate::render::{PageEvent, RenderHandle};

/// Runs every page of one document, isolating page failures.
pub struct DocumentProcessor {
    renderer: RenderHandle,
    pages: Arc<PageProcessor>,
    permits: Arc<Semaphore>,
}

impl DocumentProcessor {
    /// `parallelism` bounds how many pages are analysed and encoded at once.
    pub fn new(renderer: RenderHandle, pages: Arc<PageProcessor>, parallelism: usize) -> Self {
        Self {
            renderer,
            pages,
            permits: Arc::new(Semaphore::new(parallelism.max(1))),
        }
    }

    /// Process the document at `path`. A document-level failure is recorded
    /// in the report rather than returned.
    #[instrument(skip(self), fields(document = %display_name(path)))]
    pub async fn process(&self, path: &Path) -> DocumentReport {
        let name = display_name(path);
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        match self.process_pages(path, &stem).await {
            Ok(pages) => {
                let report = DocumentReport {
                    name,
                    source: path.to_path_buf(),
                    pages,
                    error: None,
                };
                info!("{}", report.summary_line());
                report
            }
            Err(err) => {
                error!(document = %name, error = %err, "Document failed");
                DocumentReport::failed(name, path.to_path_buf(), err.to_string())
            }
        }
    }

    async fn process_pages(&self, path: &Path, stem: &str) -> Result<Vec<PageResult>> {
        let mut stream = self.renderer.open(path).await?;
        info!(pages = stream.page_count, "Document opened");

        let mut tasks = JoinSet::new();
        let mut results = Vec::with_capacity(stream.page_count);

        while let Some(event) = stream.events.recv().await {
            match event {
                PageEvent::Rendered(page) => {
                    let permit = Arc::clone(&self.permits)
                        .acquire_owned()
                        .await
                        .map_err(|_| CensuraError::Document("page scheduler closed".into()))?;
                    let index = page.index;
                    let file_name = self.pages.file_name(stem, index);
                    let pages = Arc::clone(&self.pages);
                    let stem = stem.to_owned();
                    tasks.spawn(
                        async move {
                            let work = async move { pages.process(&stem, page).await };
                            let result = isolated(index, file_name, work).await;
                            drop(permit);
                            result
                        }
                        .in_current_span(),
                    );
                }
                PageEvent::Failed { index, error } => {
                    error!(page = index, error = %error, "Page failed to render");
                    results.push(PageResult::failed(
                        index,
                        self.pages.file_name(stem, index),
                        error.to_string(),
                    ));
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                // The page is filled in as failed below.
                Err(err) => error!(error = %err, "Page task lost"),
            }
        }

        // Pages the renderer never got to (it stopped early) count as failed.
        for index in 0..stream.page_count {
            if !results.iter().any(|result| result.index == index) {
                results.push(PageResult::failed(
                    index,
                    self.pages.file_name(stem, index),
                    "page was never rendered",
                ));
            }
        }
        results.sort_by_key(|result| result.index);
        Ok(results)
    }
}

/// Run one page's work on its own task, so a panic inside it fails only
/// that page.
async fn isolated<F>(index: usize, file_name: String, work: F) -> PageResult
where
    F: Future<Output = PageResult> + Send + 'static,
{
    match tokio::spawn(work.in_current_span()).await {
        Ok(result) => result,
        Err(err) => {
            error!(page = index, error = %err, "Page task aborted");
            PageResult::failed(index, file_name, format!("page task aborted: {err}"))
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

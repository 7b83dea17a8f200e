// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render worker — a dedicated thread that owns the PDF backend.
//
// pdfium handles are not `Send`, so the loader is built on the worker thread
// and never leaves it. For each requested document the worker rasterizes
// every page and searches its text layer, streaming the results through a
// bounded channel so rendering runs ahead of OCR without piling up bitmaps.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use censura_core::error::{CensuraError, Result};
use censura_document::{
    CandidateRegion, DocumentLoader, IdentifierMatcher, RasterPage, TextLayerLocator, rasterize,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Builds the document backend on the render thread.
pub type LoaderFactory = Box<dyn FnOnce() -> Result<Box<dyn DocumentLoader>> + Send>;

/// A rasterized page plus what the text-layer channel found on it.
#[derive(Debug)]
pub struct RenderedPage {
    pub index: usize,
    pub raster: RasterPage,
    /// Text-layer hits, already in pixel space.
    pub text_candidates: Vec<CandidateRegion>,
}

/// One item of a document's page stream.
#[derive(Debug)]
pub enum PageEvent {
    Rendered(RenderedPage),
    Failed { index: usize, error: CensuraError },
}

/// An opened document: its page count and the stream of its pages, in order.
pub struct PageStream {
    pub page_count: usize,
    pub events: mpsc::Receiver<PageEvent>,
}

struct RenderRequest {
    path: PathBuf,
    opened: oneshot::Sender<Result<usize>>,
    events: mpsc::Sender<PageEvent>,
}

/// Owner of the render thread.
pub struct RenderWorker {
    handle: RenderHandle,
    thread: JoinHandle<()>,
}

impl RenderWorker {
    /// Spawn the render thread and build the backend on it.
    ///
    /// Resolves once the backend is ready; a backend that fails to load is a
    /// startup failure.
    pub async fn start(
        loader: LoaderFactory,
        matcher: Arc<IdentifierMatcher>,
        dpi: u32,
        queue_depth: usize,
    ) -> Result<Self> {
        let (requests, inbox) = mpsc::unbounded_channel();
        let (ready_tx, ready) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("censura-render".into())
            .spawn(move || {
                let loader = match loader() {
                    Ok(loader) => {
                        let _ = ready_tx.send(Ok(()));
                        loader
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                serve(loader.as_ref(), inbox, &matcher, dpi);
            })
            .map_err(|err| CensuraError::Startup(format!("failed to spawn render worker: {err}")))?;

        ready
            .await
            .map_err(|_| CensuraError::Startup("render worker exited during startup".into()))??;

        info!(dpi, "Render worker started");
        Ok(Self {
            handle: RenderHandle {
                requests,
                queue_depth: queue_depth.max(1),
            },
            thread,
        })
    }

    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    /// Close the request queue and join the thread. Outstanding handles must
    /// be dropped first.
    pub fn shutdown(self) {
        let Self { handle, thread } = self;
        drop(handle);
        if thread.join().is_err() {
            warn!("Render worker panicked");
        }
        debug!("Render worker stopped");
    }
}

/// Cloneable request side of the [`RenderWorker`].
#[derive(Clone)]
pub struct RenderHandle {
    requests: mpsc::UnboundedSender<RenderRequest>,
    queue_depth: usize,
}

impl RenderHandle {
    /// Open `path` on the render thread and start streaming its pages.
    ///
    /// An unreadable document fails here with [`CensuraError::Document`];
    /// per-page render failures arrive later as [`PageEvent::Failed`].
    pub async fn open(&self, path: &Path) -> Result<PageStream> {
        let (opened_tx, opened) = oneshot::channel();
        let (events_tx, events) = mpsc::channel(self.queue_depth);
        self.requests
            .send(RenderRequest {
                path: path.to_path_buf(),
                opened: opened_tx,
                events: events_tx,
            })
            .map_err(|_| CensuraError::Document("render worker has stopped".into()))?;

        let page_count = opened
            .await
            .map_err(|_| CensuraError::Document("render worker dropped the document".into()))??;
        Ok(PageStream { page_count, events })
    }
}

fn serve(
    loader: &dyn DocumentLoader,
    mut inbox: mpsc::UnboundedReceiver<RenderRequest>,
    matcher: &IdentifierMatcher,
    dpi: u32,
) {
    while let Some(request) = inbox.blocking_recv() {
        render_document(loader, request, matcher, dpi);
    }
}

fn render_document(
    loader: &dyn DocumentLoader,
    request: RenderRequest,
    matcher: &IdentifierMatcher,
    dpi: u32,
) {
    let RenderRequest {
        path,
        opened,
        events,
    } = request;

    let source = match loader.open(&path) {
        Ok(source) => source,
        Err(err) => {
            let _ = opened.send(Err(err));
            return;
        }
    };
    let page_count = source.page_count();
    if opened.send(Ok(page_count)).is_err() {
        return;
    }

    let locator = TextLayerLocator::new(matcher);
    for index in 0..page_count {
        let event = match rasterize(source.as_ref(), index, dpi) {
            Ok(raster) => {
                let text_candidates = locator.locate(source.as_ref(), index, raster.zoom);
                PageEvent::Rendered(RenderedPage {
                    index,
                    raster,
                    text_candidates,
                })
            }
            Err(error) => PageEvent::Failed { index, error },
        };
        if events.blocking_send(event).is_err() {
            debug!(path = %path.display(), index, "Page stream closed early");
            return;
        }
    }
    debug!(path = %path.display(), page_count, "Document rendered");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeLoader, FakePage, matcher};
    use censura_document::{Rect, TextRun};

    async fn worker(loader: FakeLoader) -> RenderWorker {
        RenderWorker::start(
            Box::new(move || Ok(Box::new(loader) as Box<dyn DocumentLoader>)),
            Arc::new(matcher(&["1016071566"])),
            72,
            2,
        )
        .await
        .expect("starts")
    }

    #[tokio::test]
    async fn pages_stream_in_order_with_text_hits() {
        let document = FakeDocument::new(vec![
            FakePage::blank(),
            FakePage::blank().with_text(TextRun::new(
                "CC 1016071566",
                Rect::new(10.0, 10.0, 140.0, 22.0),
            )),
            FakePage::blank(),
        ]);
        let worker = worker(FakeLoader::new().with("a.pdf", document)).await;

        let mut stream = worker.handle().open(Path::new("in/a.pdf")).await.expect("opens");
        assert_eq!(stream.page_count, 3);

        let mut seen = Vec::new();
        while let Some(event) = stream.events.recv().await {
            match event {
                PageEvent::Rendered(page) => seen.push((page.index, page.text_candidates.len())),
                PageEvent::Failed { index, error } => panic!("page {index} failed: {error}"),
            }
        }
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 0)]);
        worker.shutdown();
    }

    #[tokio::test]
    async fn render_failure_is_a_page_event() {
        let document = FakeDocument::new(vec![FakePage::blank().failing_render(), FakePage::blank()]);
        let worker = worker(FakeLoader::new().with("b.pdf", document)).await;

        let mut stream = worker.handle().open(Path::new("b.pdf")).await.expect("opens");
        let first = stream.events.recv().await.expect("event");
        assert!(matches!(
            first,
            PageEvent::Failed {
                index: 0,
                error: CensuraError::Render(_)
            }
        ));
        assert!(matches!(
            stream.events.recv().await,
            Some(PageEvent::Rendered(RenderedPage { index: 1, .. }))
        ));
        worker.shutdown();
    }

    #[tokio::test]
    async fn unknown_document_fails_to_open() {
        let worker = worker(FakeLoader::new()).await;
        let result = worker.handle().open(Path::new("missing.pdf")).await;
        assert!(matches!(result, Err(CensuraError::Document(_))));
        worker.shutdown();
    }

    #[tokio::test]
    async fn backend_failure_is_a_startup_error() {
        let result = RenderWorker::start(
            Box::new(|| Err(CensuraError::Startup("no pdfium".into()))),
            Arc::new(matcher(&["1016071566"])),
            72,
            1,
        )
        .await;
        assert!(matches!(result, Err(CensuraError::Startup(_))));
    }
}

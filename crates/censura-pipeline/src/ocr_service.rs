// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR service — the process-wide recognition engine behind a queue.
//
// Each worker thread owns one recognizer instance and serves one request at a
// time, so no engine is ever invoked concurrently. Page tasks hold a cheap
// `OcrHandle` and await replies. The timeout bounds two waits separately:
// getting a free worker, and the recognition itself once a worker has it. A
// worker stuck in a runaway call therefore delays later pages by at most one
// timeout each.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use censura_core::error::{CensuraError, Result};
use censura_document::{RecognizedSpan, TextRecognizer};
use image::RgbImage;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Pending requests allowed per worker before senders wait.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

struct Job {
    image: Arc<RgbImage>,
    started: oneshot::Sender<()>,
    reply: oneshot::Sender<Result<Vec<RecognizedSpan>>>,
}

/// Owner of the OCR worker threads. Dropping every [`OcrHandle`] and calling
/// [`OcrService::shutdown`] releases the engines.
pub struct OcrService {
    handle: OcrHandle,
    workers: Vec<JoinHandle<()>>,
}

impl OcrService {
    /// Spawn one worker per recognizer.
    ///
    /// Fails with [`CensuraError::Startup`] when no recognizer is supplied or
    /// a thread cannot be spawned.
    pub fn start(recognizers: Vec<Box<dyn TextRecognizer>>, timeout: Duration) -> Result<Self> {
        if recognizers.is_empty() {
            return Err(CensuraError::Startup(
                "OCR service needs at least one recognizer".into(),
            ));
        }

        let (sender, receiver) = mpsc::channel(recognizers.len() * QUEUE_DEPTH_PER_WORKER);
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(recognizers.len());

        for (id, recognizer) in recognizers.into_iter().enumerate() {
            let receiver = Arc::clone(&receiver);
            let worker = std::thread::Builder::new()
                .name(format!("censura-ocr-{id}"))
                .spawn(move || serve(id, recognizer, receiver))
                .map_err(|err| {
                    CensuraError::Startup(format!("failed to spawn OCR worker {id}: {err}"))
                })?;
            workers.push(worker);
        }

        info!(workers = workers.len(), ?timeout, "OCR service started");
        Ok(Self {
            handle: OcrHandle { sender, timeout },
            workers,
        })
    }

    /// A handle page tasks use to submit bitmaps.
    pub fn handle(&self) -> OcrHandle {
        self.handle.clone()
    }

    /// Close the queue and wait for the workers to finish.
    ///
    /// Workers exit once every handle is dropped and the queue drains, so
    /// callers must release their handles first.
    pub fn shutdown(self) {
        let Self { handle, workers } = self;
        drop(handle);
        for worker in workers {
            if worker.join().is_err() {
                warn!("OCR worker panicked during shutdown");
            }
        }
        info!("OCR service stopped");
    }
}

/// Cloneable submission side of the [`OcrService`].
#[derive(Clone)]
pub struct OcrHandle {
    sender: mpsc::Sender<Job>,
    timeout: Duration,
}

impl OcrHandle {
    /// Recognize `image` on the next free worker.
    ///
    /// Returns [`CensuraError::OcrTimeout`] when no worker takes the request
    /// within the timeout, or when recognition itself outlasts it. A request
    /// abandoned in the queue is skipped by the workers; one abandoned
    /// mid-call finishes in the background and its result is discarded.
    pub async fn recognize(&self, image: Arc<RgbImage>) -> Result<Vec<RecognizedSpan>> {
        let (started_tx, started) = oneshot::channel();
        let (reply_tx, reply) = oneshot::channel();
        let job = Job {
            image,
            started: started_tx,
            reply: reply_tx,
        };

        let queued = async {
            self.sender
                .send(job)
                .await
                .map_err(|_| CensuraError::Ocr("OCR service is shut down".into()))?;
            started
                .await
                .map_err(|_| CensuraError::Ocr("OCR worker dropped the request".into()))
        };
        match tokio::time::timeout(self.timeout, queued).await {
            Ok(accepted) => accepted?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "No OCR worker became free in time");
                return Err(CensuraError::OcrTimeout(self.timeout));
            }
        }

        match tokio::time::timeout(self.timeout, reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CensuraError::Ocr("OCR worker stopped mid-request".into())),
            Err(_) => Err(CensuraError::OcrTimeout(self.timeout)),
        }
    }
}

fn serve(
    id: usize,
    mut recognizer: Box<dyn TextRecognizer>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
) {
    debug!(worker = id, "OCR worker ready");
    loop {
        let job = {
            // A poisoned lock only means a sibling panicked while waiting;
            // the receiver itself is still sound.
            let mut queue = receiver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.blocking_recv()
        };
        let Some(job) = job else { break };

        if job.started.send(()).is_err() {
            debug!(worker = id, "Request abandoned before it started");
            continue;
        }
        let recognized = AssertUnwindSafe(|| recognizer.recognize(&job.image));
        let result = std::panic::catch_unwind(recognized).unwrap_or_else(|_| {
            error!(worker = id, "OCR engine panicked");
            Err(CensuraError::Ocr("OCR engine panicked".into()))
        });
        if job.reply.send(result).is_err() {
            debug!(worker = id, "Caller gave up; discarding OCR result");
        }
    }
    debug!(worker = id, "OCR worker exiting");
}

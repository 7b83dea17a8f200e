// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// censura-pipeline — Batch orchestration for Censura.
//
// One render thread owns the PDF backend, one or more OCR threads own the
// recognition engines, and page tasks on the tokio runtime tie the two
// detection channels together before redacting and encoding. Failures are
// isolated per page and per document.

pub mod batch;
pub mod document;
pub mod ocr_service;
pub mod page;
pub mod render;

#[cfg(test)]
mod testing;

pub use batch::{Backends, BatchProcessor, RecognizerFactory, REPORT_FILE_NAME, discover_documents};
pub use document::DocumentProcessor;
pub use ocr_service::{OcrHandle, OcrService};
pub use page::PageProcessor;
pub use render::{LoaderFactory, PageEvent, RenderHandle, RenderWorker, RenderedPage};

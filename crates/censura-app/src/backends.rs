// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Production engines: pdfium for documents and, with the `ocr` feature, the
// `ocrs` recognizer. Both are built lazily by the pipeline.

use censura_core::config::CensuraConfig;
use censura_core::error::Result;
use censura_document::{DocumentLoader, PdfiumLoader};
use censura_pipeline::{Backends, RecognizerFactory};

pub fn for_config(config: &CensuraConfig) -> Backends {
    Backends {
        loader: Box::new(|| -> Result<Box<dyn DocumentLoader>> {
            Ok(Box::new(PdfiumLoader::new()?))
        }),
        recognizers: recognizers(config),
    }
}

#[cfg(feature = "ocr")]
fn recognizers(config: &CensuraConfig) -> Option<RecognizerFactory> {
    use censura_document::{OcrConfig, OcrEngine, TextRecognizer};

    let models = OcrConfig::from_models_dir(config.ocr.models_dir.as_deref());
    Some(Box::new(move |workers: usize| -> Result<Vec<Box<dyn TextRecognizer>>> {
        (0..workers)
            .map(|_| OcrEngine::new(&models).map(|engine| Box::new(engine) as Box<dyn TextRecognizer>))
            .collect()
    }))
}

#[cfg(not(feature = "ocr"))]
fn recognizers(_config: &CensuraConfig) -> Option<RecognizerFactory> {
    None
}

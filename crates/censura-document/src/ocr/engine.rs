// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine backed by the `ocrs` crate, a pure-Rust OCR engine whose neural
// network models are executed via `rten`.
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`) — decodes characters from detected regions.
//
// Running the `ocrs-cli` tool once downloads both to `~/.cache/ocrs/`:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use censura_core::error::{CensuraError, Result};
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::ocr::{RecognizedSpan, TextRecognizer};

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`, falling
/// back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Where to find the model files for an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    /// Returns a config pointing at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Model directory from the run configuration, or the default cache.
    pub fn from_models_dir(dir: Option<&Path>) -> Self {
        dir.map(Self::from_dir).unwrap_or_default()
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(CensuraError::Startup(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models, \
                     or point ocr.models_dir at a directory containing them",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Text recognizer over the `ocrs` engine.
///
/// Model loading is the expensive step: build one engine at startup and
/// reuse it for every page.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models and build the engine.
    ///
    /// **Performance:** `ocrs` and `rten` must be compiled with optimizations;
    /// debug builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = load_model(&config.detection_model_path)?;
        info!("Loading OCR recognition model");
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| CensuraError::Startup(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Detect, group and recognize text lines, returning one span per
    /// non-empty line.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_lines(&self, image: &RgbImage) -> Result<Vec<RecognizedSpan>> {
        let (width, height) = image.dimensions();
        let source = ImageSource::from_bytes(image.as_raw(), (width, height)).map_err(|err| {
            CensuraError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| CensuraError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| CensuraError::Ocr(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| CensuraError::Ocr(format!("line recognition failed: {}", err)))?;

        let mut spans = Vec::with_capacity(lines.len());
        for line in lines.iter().flatten() {
            let text = line.to_string();
            if text.trim().is_empty() {
                continue;
            }
            let corners = line.rotated_rect().corners();
            spans.push(RecognizedSpan {
                polygon: corners.map(|point| (point.x, point.y)),
                text,
                confidence: None,
            });
        }

        debug!(
            words = word_rects.len(),
            lines = spans.len(),
            "OCR recognition complete"
        );
        Ok(spans)
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognizedSpan>> {
        self.recognize_lines(image)
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        CensuraError::Startup(format!(
            "failed to load OCR model from {}: {}",
            path.display(),
            err
        ))
    })
}

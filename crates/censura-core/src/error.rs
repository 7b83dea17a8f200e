// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Censura.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Censura operations.
#[derive(Debug, Error)]
pub enum CensuraError {
    // -- Page-level errors --
    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("text layer extraction failed: {0}")]
    TextExtraction(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("OCR timed out after {0:?}")]
    OcrTimeout(Duration),

    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Document / batch --
    #[error("document processing failed: {0}")]
    Document(String),

    #[error("startup failed: {0}")]
    Startup(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("config file could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CensuraError {
    /// Whether a detection channel may swallow this error and carry on as if
    /// it had found nothing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TextExtraction(_) | Self::Ocr(_) | Self::OcrTimeout(_)
        )
    }

    /// Whether this error ends processing of the current page only.
    pub fn is_page_fatal(&self) -> bool {
        matches!(self, Self::Render(_) | Self::Encode(_) | Self::Io(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CensuraError>;

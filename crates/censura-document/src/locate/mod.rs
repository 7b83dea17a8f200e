// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Locators — the two detection channels. Each proposes candidate regions
// for one page; neither can fail the page.

pub mod ocr;
pub mod text_layer;

pub use ocr::OcrLocator;
pub use text_layer::TextLayerLocator;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — redaction painting and lossy output encoding.

pub mod encode;
pub mod redact;

pub use encode::{EncodeSettings, EncodedImage, encode, flatten_alpha};
pub use redact::redact;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration. Assembled once at startup (defaults, then an optional
// TOML file, then environment/CLI overrides applied by the binary) and passed
// by reference into the pipeline. Nothing below the binary reads the process
// environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CensuraError, Result};

/// Highest rendering resolution accepted by [`CensuraConfig::validate`].
pub const MAX_DPI: u32 = 1200;

/// Lossy still-image formats the encoder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
}

impl OutputFormat {
    /// File extension (without the dot) for output pages.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
        }
    }

    /// Parse a user-supplied format name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// The three configured sensitive identifiers, as literal digit strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// National ID number.
    pub primary: Option<String>,
    /// Phone number.
    pub secondary: Option<String>,
    /// Institutional code.
    pub tertiary: Option<String>,
}

impl IdentifierConfig {
    /// All configured (non-blank) identifiers, in primary/secondary/tertiary order.
    pub fn values(&self) -> Vec<&str> {
        [&self.primary, &self.secondary, &self.tertiary]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// Digit grouping used to build a formatted variant for identifiers of one
/// exact length, e.g. length 10 with groups `[1, 3, 3, 3]` → `D.DDD.DDD.DDD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingRule {
    pub length: usize,
    pub groups: Vec<usize>,
}

/// Optical recognition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Run the OCR channel at all. Disabling it leaves only the text layer.
    pub enabled: bool,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` means the engine's default cache directory.
    pub models_dir: Option<PathBuf>,
    /// Upper bound on a single page's recognition call.
    pub timeout_secs: u64,
    /// Number of engine instances. Each instance serves one call at a time.
    pub workers: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            models_dir: None,
            timeout_secs: 120,
            workers: 1,
        }
    }
}

impl OcrSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete, immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensuraConfig {
    pub identifiers: IdentifierConfig,
    /// Lossy encode quality, 0–100.
    pub quality: u8,
    /// Render resolution in dots per inch.
    pub dpi: u32,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Margin in pixels added around every detected rectangle.
    pub padding: u32,
    pub grouping: Vec<GroupingRule>,
    pub ocr: OcrSettings,
}

impl Default for CensuraConfig {
    fn default() -> Self {
        Self {
            identifiers: IdentifierConfig::default(),
            quality: 75,
            dpi: 150,
            input_dir: PathBuf::from("pdfs"),
            output_dir: PathBuf::from("output"),
            format: OutputFormat::WebP,
            padding: 5,
            grouping: vec![
                GroupingRule {
                    length: 10,
                    groups: vec![1, 3, 3, 3],
                },
                GroupingRule {
                    length: 11,
                    groups: vec![2, 3, 3, 3],
                },
            ],
            ocr: OcrSettings::default(),
        }
    }
}

impl CensuraConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Page coordinate units (1/72 inch) to pixels.
    pub fn zoom(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        let identifiers = self.identifiers.values();
        if identifiers.is_empty() {
            return Err(CensuraError::Config(
                "no identifiers configured; set at least one of primary, secondary, tertiary"
                    .into(),
            ));
        }
        for raw in identifiers {
            let normalized: String = raw
                .chars()
                .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
                .collect();
            if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_digit()) {
                return Err(CensuraError::InvalidIdentifier(format!(
                    "expected a digit string, got {} characters of other text",
                    raw.chars().count()
                )));
            }
        }
        if self.quality > 100 {
            return Err(CensuraError::Config(format!(
                "quality must be between 0 and 100, got {}",
                self.quality
            )));
        }
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(CensuraError::Config(format!(
                "dpi must be between 1 and {MAX_DPI}, got {}",
                self.dpi
            )));
        }
        for rule in &self.grouping {
            if rule.groups.contains(&0) || rule.groups.iter().sum::<usize>() != rule.length {
                return Err(CensuraError::Config(format!(
                    "grouping {:?} does not cover identifiers of length {}",
                    rule.groups, rule.length
                )));
            }
        }
        if self.ocr.enabled && self.ocr.workers == 0 {
            return Err(CensuraError::Config("ocr.workers must be at least 1".into()));
        }
        Ok(())
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command line and environment. Precedence, lowest first: built-in defaults,
// the TOML file given with `--config`, environment variables, flags.

use std::path::PathBuf;

use censura_core::config::{CensuraConfig, OutputFormat};
use censura_core::error::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "censura")]
#[command(about = "Redact sensitive identifiers from PDF pages and save each page as a lossy image")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CENSURA_CONFIG")]
    pub config: Option<PathBuf>,

    /// National ID number to redact
    #[arg(long, env = "CEDULA")]
    pub cedula: Option<String>,

    /// Phone number to redact
    #[arg(long, env = "CELULAR")]
    pub celular: Option<String>,

    /// Institutional code to redact
    #[arg(long, env = "CODIGO")]
    pub codigo: Option<String>,

    /// Encode quality, 0-100
    #[arg(short, long, env = "QUALITY", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Render resolution in DPI
    #[arg(long, env = "DPI")]
    pub dpi: Option<u32>,

    /// Directory holding the PDFs to process
    #[arg(short, long, env = "INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory the page images are written to
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output image format: webp or jpeg
    #[arg(short, long, env = "FORMAT", value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Pixels of margin around every redacted area
    #[arg(long)]
    pub padding: Option<u32>,

    /// Skip OCR and search only embedded text
    #[arg(long = "no-ocr")]
    pub no_ocr: bool,

    /// Directory with the OCR model files
    #[arg(long, env = "OCR_MODELS_DIR")]
    pub ocr_models: Option<PathBuf>,

    /// Per-page OCR time limit in seconds
    #[arg(long)]
    pub ocr_timeout: Option<u64>,

    /// Number of OCR engine instances
    #[arg(long)]
    pub ocr_workers: Option<usize>,
}

impl Cli {
    /// Build and validate the run configuration.
    pub fn into_config(self) -> Result<CensuraConfig> {
        let mut config = match &self.config {
            Some(path) => CensuraConfig::load(path)?,
            None => CensuraConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(self, config: &mut CensuraConfig) {
        if let Some(value) = self.cedula {
            config.identifiers.primary = Some(value);
        }
        if let Some(value) = self.celular {
            config.identifiers.secondary = Some(value);
        }
        if let Some(value) = self.codigo {
            config.identifiers.tertiary = Some(value);
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if self.no_ocr {
            config.ocr.enabled = false;
        }
        if let Some(dir) = self.ocr_models {
            config.ocr.models_dir = Some(dir);
        }
        if let Some(secs) = self.ocr_timeout {
            config.ocr.timeout_secs = secs;
        }
        if let Some(workers) = self.ocr_workers {
            config.ocr.workers = workers;
        }
    }
}

fn parse_format(name: &str) -> std::result::Result<OutputFormat, String> {
    OutputFormat::from_name(name).ok_or_else(|| format!("unknown format `{name}`; expected webp or jpeg"))
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Censura — batch redaction of sensitive identifiers in PDF pages.
//
// Entry point. Initialises logging, assembles the configuration, runs the
// batch, and prints the per-document summary.

mod backends;
mod cli;

use std::process::ExitCode;

use censura_core::config::CensuraConfig;
use censura_core::types::{BatchOutcome, BatchSummary, mask_identifier};
use censura_pipeline::BatchProcessor;
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    log_banner(&config);

    let processor = match BatchProcessor::new(config) {
        Ok(processor) => processor,
        Err(e) => {
            tracing::error!(error = %e, "could not prepare the batch");
            return ExitCode::FAILURE;
        }
    };

    let backends = backends::for_config(processor.config());
    match processor.run(backends).await {
        Ok(BatchOutcome::Completed(summary)) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Ok(BatchOutcome::NothingToDo) => {
            println!(
                "No PDF files found in {}. Add some and run censura again.",
                processor.config().input_dir.display()
            );
            ExitCode::SUCCESS
        }
        Ok(BatchOutcome::InputDirCreated(dir)) => {
            println!(
                "Created {}. Put the PDF files to process there and run censura again.",
                dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

fn log_banner(config: &CensuraConfig) {
    let identifiers: Vec<String> = config
        .identifiers
        .values()
        .into_iter()
        .map(mask_identifier)
        .collect();
    tracing::info!(
        quality = config.quality,
        dpi = config.dpi,
        format = config.format.extension(),
        ocr = config.ocr.enabled,
        identifiers = ?identifiers,
        "Censura starting"
    );
}

fn print_summary(summary: &BatchSummary) {
    for document in &summary.documents {
        println!("{}", document.summary_line());
    }
    let failed = summary.documents_failed();
    println!(
        "{} document(s) processed{}; {} page image(s) in {}",
        summary.documents.len(),
        if failed > 0 {
            format!(", {failed} failed")
        } else {
            String::new()
        },
        summary.pages_written(),
        summary.output_dir.display()
    );
}

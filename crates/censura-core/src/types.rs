// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: page lifecycle, per-unit outcomes and run summaries.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single page inside the pipeline.
///
/// `Rendered → Analyzed → {Redacted | Clean} → Encoded`, with `Failed`
/// reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStage {
    /// Bitmap produced by the rasterizer.
    Rendered,
    /// Both locators and the unifier have run.
    Analyzed,
    /// At least one sensitive region was painted.
    Redacted,
    /// Nothing sensitive found; bitmap untouched.
    Clean,
    /// Encoded and written.
    Encoded,
    /// Rendering, encoding or writing failed.
    Failed,
}

impl PageStage {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: PageStage) -> bool {
        use PageStage::*;
        match (self, next) {
            (Rendered, Analyzed) => true,
            (Analyzed, Redacted) | (Analyzed, Clean) => true,
            (Redacted, Encoded) | (Clean, Encoded) => true,
            (Encoded, _) | (Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Encoded | Self::Failed)
    }
}

/// Final status of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Encoded without any redaction.
    Clean,
    /// Encoded after painting sensitive regions.
    Redacted,
    /// The page could not be produced; the message says why.
    Failed(String),
}

impl PageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of processing one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 0-based page index within its document.
    pub index: usize,
    /// Output file name (not the full path).
    pub file_name: String,
    /// Size of the encoded image in bytes (0 on failure).
    pub encoded_bytes: u64,
    /// Number of sensitive regions painted.
    pub regions: usize,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn failed(index: usize, file_name: String, reason: impl Into<String>) -> Self {
        Self {
            index,
            file_name,
            encoded_bytes: 0,
            regions: 0,
            outcome: PageOutcome::Failed(reason.into()),
        }
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document file name.
    pub name: String,
    pub source: PathBuf,
    /// Per-page results, ordered by page index.
    pub pages: Vec<PageResult>,
    /// Set when the document as a whole could not be processed.
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn failed(name: String, source: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            name,
            source,
            pages: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Pages that had at least one region painted.
    pub fn redacted_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.outcome == PageOutcome::Redacted)
            .count()
    }

    pub fn failed_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.outcome.is_failure())
            .count()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// One-line human summary, e.g. `scan.pdf: 2 pages, 1 page with censored data`.
    pub fn summary_line(&self) -> String {
        if let Some(error) = &self.error {
            return format!("{}: failed ({error})", self.name);
        }
        let mut line = format!(
            "{}: {}",
            self.name,
            pluralize(self.total_pages(), "page")
        );
        let redacted = self.redacted_pages();
        if redacted > 0 {
            line.push_str(&format!(
                ", {} with censored data",
                pluralize(redacted, "page")
            ));
        }
        let failed = self.failed_pages();
        if failed > 0 {
            line.push_str(&format!(", {failed} failed"));
        }
        line
    }
}

/// Aggregated outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub documents: Vec<DocumentReport>,
}

impl BatchSummary {
    pub fn documents_failed(&self) -> usize {
        self.documents.iter().filter(|doc| doc.is_failure()).count()
    }

    pub fn pages_written(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|doc| &doc.pages)
            .filter(|page| !page.outcome.is_failure())
            .count()
    }

    pub fn pages_redacted(&self) -> usize {
        self.documents.iter().map(DocumentReport::redacted_pages).sum()
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every discovered document was attempted.
    Completed(BatchSummary),
    /// The input directory exists but holds no documents.
    NothingToDo,
    /// The input directory was missing and has been created empty.
    InputDirCreated(PathBuf),
}

/// Output file name for one page: `{stem}_page{NN}.{ext}`, `NN` 0-based and
/// zero-padded to two digits.
pub fn page_file_name(document_stem: &str, index: usize, extension: &str) -> String {
    format!("{document_stem}_page{index:02}.{extension}")
}

/// Mask an identifier for logging, keeping only the last two digits.
pub fn mask_identifier(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let keep = chars.len().min(2);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, outcome: PageOutcome) -> PageResult {
        PageResult {
            index,
            file_name: page_file_name("doc", index, "webp"),
            encoded_bytes: 100,
            regions: usize::from(outcome == PageOutcome::Redacted),
            outcome,
        }
    }

    #[test]
    fn legal_stage_transitions() {
        use PageStage::*;
        assert!(Rendered.can_transition_to(Analyzed));
        assert!(Analyzed.can_transition_to(Redacted));
        assert!(Analyzed.can_transition_to(Clean));
        assert!(Redacted.can_transition_to(Encoded));
        assert!(Clean.can_transition_to(Encoded));
        assert!(Rendered.can_transition_to(Failed));
        assert!(Clean.can_transition_to(Failed));
    }

    #[test]
    fn illegal_stage_transitions() {
        use PageStage::*;
        assert!(!Rendered.can_transition_to(Encoded));
        assert!(!Redacted.can_transition_to(Clean));
        assert!(!Encoded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Rendered));
        assert!(Encoded.is_terminal() && Failed.is_terminal());
        assert!(!Analyzed.is_terminal());
    }

    #[test]
    fn file_names_are_zero_padded_and_zero_based() {
        assert_eq!(page_file_name("scan", 0, "webp"), "scan_page00.webp");
        assert_eq!(page_file_name("scan", 7, "jpg"), "scan_page07.jpg");
        assert_eq!(page_file_name("scan", 123, "webp"), "scan_page123.webp");
    }

    #[test]
    fn summary_line_uses_singular_for_one() {
        let report = DocumentReport {
            name: "scan.pdf".into(),
            source: PathBuf::from("pdfs/scan.pdf"),
            pages: vec![page(0, PageOutcome::Clean), page(1, PageOutcome::Redacted)],
            error: None,
        };
        assert_eq!(report.redacted_pages(), 1);
        assert_eq!(
            report.summary_line(),
            "scan.pdf: 2 pages, 1 page with censored data"
        );
    }

    #[test]
    fn summary_line_reports_failures() {
        let report = DocumentReport {
            name: "a.pdf".into(),
            source: PathBuf::from("a.pdf"),
            pages: vec![
                page(0, PageOutcome::Clean),
                page(1, PageOutcome::Failed("render".into())),
            ],
            error: None,
        };
        assert_eq!(report.summary_line(), "a.pdf: 2 pages, 1 failed");

        let broken = DocumentReport::failed("b.pdf".into(), PathBuf::from("b.pdf"), "corrupt");
        assert!(broken.is_failure());
        assert_eq!(broken.summary_line(), "b.pdf: failed (corrupt)");
    }

    #[test]
    fn batch_summary_counts() {
        let now = Utc::now();
        let summary = BatchSummary {
            started_at: now,
            finished_at: now,
            output_dir: PathBuf::from("output"),
            documents: vec![
                DocumentReport {
                    name: "a.pdf".into(),
                    source: PathBuf::from("a.pdf"),
                    pages: vec![
                        page(0, PageOutcome::Redacted),
                        page(1, PageOutcome::Failed("x".into())),
                    ],
                    error: None,
                },
                DocumentReport::failed("b.pdf".into(), PathBuf::from("b.pdf"), "bad"),
            ],
        };
        assert_eq!(summary.documents_failed(), 1);
        assert_eq!(summary.pages_written(), 1);
        assert_eq!(summary.pages_redacted(), 1);
    }

    #[test]
    fn mask_keeps_last_two_digits() {
        assert_eq!(mask_identifier("1016071566"), "********66");
        assert_eq!(mask_identifier("7"), "7");
        assert_eq!(mask_identifier(""), "");
    }

    #[test]
    fn page_outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&PageOutcome::Failed("boom".into())).expect("json");
        assert_eq!(json, r#"{"status":"failed","detail":"boom"}"#);
        let json = serde_json::to_string(&PageOutcome::Clean).expect("json");
        assert_eq!(json, r#"{"status":"clean"}"#);
    }
}

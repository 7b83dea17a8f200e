// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Identifier matching — normalization, formatted variants, and the
// recall-first match rule shared by both detection channels.

use censura_core::config::{CensuraConfig, GroupingRule};
use censura_core::error::{CensuraError, Result};
use censura_core::types::mask_identifier;
use tracing::debug;

/// Separator inserted between digit groups of a formatted variant.
const GROUP_SEPARATOR: char = '.';

/// Strip `.`, `-` and whitespace.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
        .collect()
}

/// Render `digits` as dot-separated groups of the given sizes.
///
/// Returns `None` when the group sizes do not add up to the digit count.
pub fn formatted_variant(digits: &str, groups: &[usize]) -> Option<String> {
    let chars: Vec<char> = digits.chars().collect();
    if groups.is_empty() || groups.contains(&0) || groups.iter().sum::<usize>() != chars.len() {
        return None;
    }
    let mut out = String::with_capacity(chars.len() + groups.len());
    let mut start = 0;
    for (i, size) in groups.iter().enumerate() {
        if i > 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.extend(&chars[start..start + size]);
        start += size;
    }
    Some(out)
}

/// A configured sensitive value with its derived search forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    normalized: String,
    variants: Vec<String>,
}

impl Identifier {
    /// Build an identifier from its configured literal, deriving the
    /// normalized form and any formatted variants whose grouping rule is
    /// keyed on the normalized length.
    pub fn new(raw: &str, grouping: &[GroupingRule]) -> Result<Self> {
        let raw = raw.trim();
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(CensuraError::InvalidIdentifier(
                "identifier is empty after removing separators".into(),
            ));
        }

        let variants: Vec<String> = grouping
            .iter()
            .filter(|rule| rule.length == normalized.chars().count())
            .filter_map(|rule| formatted_variant(&normalized, &rule.groups))
            .filter(|variant| variant != raw)
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            normalized,
            variants,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Masked form safe for logs.
    pub fn masked(&self) -> String {
        mask_identifier(&self.normalized)
    }

    /// Literal strings to look for in a text layer: raw, normalized, then
    /// formatted variants, without duplicates.
    pub fn search_terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = Vec::with_capacity(2 + self.variants.len());
        for term in std::iter::once(self.raw.as_str())
            .chain(std::iter::once(self.normalized.as_str()))
            .chain(self.variants.iter().map(String::as_str))
        {
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }

    /// Match if the normalized identifier occurs in the normalized text, or
    /// the raw literal occurs in the raw text.
    pub fn matches(&self, text: &str) -> bool {
        self.matches_prepared(text, &normalize(text))
    }

    /// [`Identifier::matches`] with the text's normalized form supplied, so
    /// one normalization serves every identifier.
    fn matches_prepared(&self, text: &str, normalized_text: &str) -> bool {
        normalized_text.contains(&self.normalized) || text.contains(&self.raw)
    }
}

/// Decides whether arbitrary recognized text contains any configured identifier.
///
/// No confidence threshold is applied anywhere: a missed redaction is worse
/// than an unnecessary one.
#[derive(Debug, Clone)]
pub struct IdentifierMatcher {
    identifiers: Vec<Identifier>,
}

impl IdentifierMatcher {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        Self { identifiers }
    }

    /// Build the matcher from the run configuration's identifier set.
    pub fn from_config(config: &CensuraConfig) -> Result<Self> {
        let identifiers = config
            .identifiers
            .values()
            .into_iter()
            .map(|raw| Identifier::new(raw, &config.grouping))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            count = identifiers.len(),
            masked = ?identifiers.iter().map(Identifier::masked).collect::<Vec<_>>(),
            "Identifier matcher configured"
        );
        Ok(Self::new(identifiers))
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// True when `text` contains any identifier under the match rule.
    pub fn is_match(&self, text: &str) -> bool {
        let normalized_text = normalize(text);
        self.identifiers
            .iter()
            .any(|id| id.matches_prepared(text, &normalized_text))
    }

    /// Every distinct literal search term across all identifiers.
    pub fn search_terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = Vec::new();
        for term in self.identifiers.iter().flat_map(Identifier::search_terms) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }
}

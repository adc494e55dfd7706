//! Reference dump parsing
//!
//! The retrieval step prints its results one per line:
//!
//! ```text
//! Relevant Document 0, NASDAQ_META_2024.txt, chunk index 1
//! Relevant Document 1, NASDAQ_MSFT_2021.txt, chunk index 13
//! ```
//!
//! The `Relevant Document <N>, ` label is optional and its ordinal is ignored;
//! line order is the rank. Dumps are often pasted by hand, so lines that do not
//! look like references are skipped and reported, never fatal. A line that has
//! the `, chunk index ` separator but no valid integer after it means the dump
//! is corrupted and aborts the parse.
//!
//! Surrounding whitespace on a document id is trimmed, so ids that begin or end
//! with spaces do not survive a render/parse round trip.

use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{EvalError, Result};
use crate::types::{DocumentReference, RankedReferenceList};

const CHUNK_SEPARATOR: &str = ", chunk index ";

static LABEL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^Relevant Document\s+\d+\s*,\s*").expect("label regex is valid")
});

/// Why a non-blank dump line produced no reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No `, chunk index ` separator on the line
    MissingSeparator { text: String },
    /// Nothing before the separator
    EmptyDocumentId { text: String },
}

pub type LineEntry = std::result::Result<DocumentReference, SkipReason>;

/// One non-blank input line and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number in the dump
    pub line: usize,
    pub entry: LineEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of parsing a dump: every non-blank line, in order, as a reference or a skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReferences {
    lines: Vec<ParsedLine>,
}

impl ParsedReferences {
    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }

    /// The ranked references, skipped lines removed.
    pub fn references(&self) -> RankedReferenceList {
        self.lines
            .iter()
            .filter_map(|l| l.entry.as_ref().ok().cloned())
            .collect()
    }

    pub fn skipped(&self) -> Vec<SkippedLine> {
        self.lines
            .iter()
            .filter_map(|l| match &l.entry {
                Err(reason) => Some(SkippedLine {
                    line: l.line,
                    reason: reason.clone(),
                }),
                Ok(_) => None,
            })
            .collect()
    }
}

/// Parse a reference dump into ranked references.
///
/// Output length may be shorter than the number of input lines; see
/// [`ParsedReferences::skipped`] for what was dropped.
pub fn parse_document_references(dump: &str) -> Result<ParsedReferences> {
    let mut lines = Vec::new();

    for (idx, raw) in dump.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let entry = parse_line(line).map_err(|text| EvalError::Format {
            line: line_number,
            text,
        })?;
        lines.push(ParsedLine {
            line: line_number,
            entry,
        });
    }

    Ok(ParsedReferences { lines })
}

/// Outer `Err` is a hard format failure carrying the offending text.
fn parse_line(line: &str) -> std::result::Result<LineEntry, String> {
    let body = LABEL_RE.replace(line, "");

    let Some((document, chunk)) = body.split_once(CHUNK_SEPARATOR) else {
        return Ok(Err(SkipReason::MissingSeparator {
            text: line.to_string(),
        }));
    };

    let chunk_index: u64 = chunk.trim().parse().map_err(|_| line.to_string())?;

    let document_id = document.trim();
    if document_id.is_empty() {
        return Ok(Err(SkipReason::EmptyDocumentId {
            text: line.to_string(),
        }));
    }

    Ok(Ok(DocumentReference::new(document_id, chunk_index)))
}

/// Render references in the format the retrieval step prints, ordinals starting at 0.
pub fn render_document_references(references: &[DocumentReference]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Relevant Document {}, {}", i, r))
        .collect::<Vec<_>>()
        .join("\n")
}

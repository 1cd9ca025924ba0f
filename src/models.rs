//! Core data models used throughout errkb.
//!
//! These types represent the record fields written to the knowledge base,
//! the static fix patterns, external search hits, and the aggregate result
//! of one investigation.

use serde::{Deserialize, Serialize};

/// Field set for a new Record. Every field is optional; absent fields are
/// rendered with a fixed placeholder (see [`crate::format`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub title: Option<String>,
    pub message: Option<String>,
    pub service: Option<String>,
    pub file: Option<String>,
    pub line: Option<String>,
    pub date: Option<String>,
    pub root_cause: Option<String>,
    pub fix: Option<String>,
    pub example_before: Option<String>,
    pub example_after: Option<String>,
}

/// A pre-authored diagnosis for a known error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixPattern {
    pub code: String,
    pub title: String,
    pub root_cause: String,
    pub fix: String,
    #[serde(default)]
    pub example_before: Option<String>,
    #[serde(default)]
    pub example_after: Option<String>,
}

/// One hit returned by the external search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

/// Caller-supplied description of the error being investigated.
#[derive(Debug, Clone, Default)]
pub struct Inquiry {
    pub code: String,
    pub service: Option<String>,
    pub file: Option<String>,
    pub line: Option<String>,
}

/// Everything one investigation found. Absent values are explicit
/// (`None`, empty vec, `false`), never omitted.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationResult {
    pub code: String,
    pub local_record: Option<String>,
    pub fix_pattern: Option<FixPattern>,
    pub external_results: Vec<SearchResult>,
    pub newly_recorded: bool,
}

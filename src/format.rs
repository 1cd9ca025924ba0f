//! On-disk Record format.
//!
//! A knowledge base document is a preamble line followed by Records:
//!
//! ```text
//! # Pre-Commit Build Errors - Confluence Reference
//!
//!
//! ## CS0161 - Not all code paths return a value
//!
//! **Error Message**: Build error occurred
//! ...
//! ---
//! ```
//!
//! Documents written by earlier runs must stay readable, so the template
//! below is byte-for-byte fixed.

use crate::models::RecordFields;

/// Marker that starts every Record header line.
pub const HEADER_MARKER: &str = "## ";

/// Trailing line of every Record.
pub const SEPARATOR: &str = "---";

const DEFAULT_TITLE: &str = "Build Error";
const DEFAULT_MESSAGE: &str = "Build error occurred";
const DEFAULT_FIX: &str = "Investigate the error";
pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// `value`, or [`UNKNOWN`] when it is absent or blank.
pub fn or_unknown(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// True if `line` is the header line of the Record for `code`.
pub fn is_header_for(line: &str, code: &str) -> bool {
    line.strip_prefix(HEADER_MARKER)
        .and_then(|rest| rest.strip_prefix(code))
        .is_some_and(|rest| rest.starts_with(" -"))
}

/// True if `line` looks like any Record header.
pub fn is_header(line: &str) -> bool {
    line.starts_with(HEADER_MARKER)
}

/// Extract the code from a header line, if the line is one.
pub fn header_code(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(HEADER_MARKER)?;
    let (code, _) = rest.split_once(" -")?;
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// First bytes of a freshly created document.
pub fn document_preamble(preamble: &str) -> String {
    format!("{}\n\n", preamble)
}

/// Render a complete Record block, including the leading blank line and
/// the trailing separator.
pub fn render_record(code: &str, fields: &RecordFields) -> String {
    let or = |value: &Option<String>, default: &'static str| -> String {
        value.clone().unwrap_or_else(|| default.to_string())
    };

    format!(
        "\n## {code} - {title}\n\
         \n\
         **Error Message**: {message}\n\
         \n\
         **Service**: {service}\n\
         \n\
         **File**: {file}\n\
         \n\
         **Line**: {line}\n\
         \n\
         **Date**: {date}\n\
         \n\
         **Root Cause**: {root_cause}\n\
         \n\
         **Quick Fix**: {fix}\n\
         \n\
         **Code Example**:\n\
         \n\
         ```csharp\n\
         // BEFORE (broken):\n\
         {before}\n\
         ```\n\
         \n\
         ```csharp\n\
         // AFTER (fixed):\n\
         {after}\n\
         ```\n\
         \n\
         **Prevention**: Run 'dotnet build' before committing to catch errors early.\n\
         \n\
         {separator}\n",
        code = code,
        title = or(&fields.title, DEFAULT_TITLE),
        message = or(&fields.message, DEFAULT_MESSAGE),
        service = or(&fields.service, UNKNOWN),
        file = or(&fields.file, UNKNOWN),
        line = or(&fields.line, UNKNOWN),
        date = or(&fields.date, UNKNOWN),
        root_cause = or(&fields.root_cause, UNKNOWN),
        fix = or(&fields.fix, DEFAULT_FIX),
        before = or(&fields.example_before, NOT_AVAILABLE),
        after = or(&fields.example_after, NOT_AVAILABLE),
        separator = SEPARATOR,
    )
}

//! Rendering of an [`InvestigationResult`] for the terminal.

use anyhow::Result;
use std::fmt::Write as _;

use crate::format::or_unknown;
use crate::models::{Inquiry, InvestigationResult};

const RULE_WIDTH: usize = 60;

/// Text report for humans, section by section.
pub fn render_text(
    inquiry: &Inquiry,
    result: &InvestigationResult,
    page_url: Option<&str>,
) -> String {
    let mut out = String::new();
    let code = &result.code;

    section(&mut out, &format!("Searching for error: {}", code));
    match &result.local_record {
        Some(record) => {
            out.push_str("Found in Local Error Database:\n");
            out.push_str(&"-".repeat(40));
            out.push('\n');
            out.push_str(record);
            out.push_str("\n\n");
        }
        None => {
            let _ = writeln!(out, "Error {} not found in local database.\n", code);
        }
    }

    section(&mut out, "Fix Suggestion");
    match &result.fix_pattern {
        Some(p) => {
            let _ = writeln!(out, "Error: {} - {}\n", code, p.title);
            let _ = writeln!(out, "Root Cause:\n  {}\n", p.root_cause);
            let _ = writeln!(out, "Quick Fix:\n  {}\n", p.fix);
            if let (Some(before), Some(after)) = (&p.example_before, &p.example_after) {
                out.push_str("Code Example:\n\n");
                let _ = writeln!(out, "  // BEFORE (broken):\n{}\n", before);
                let _ = writeln!(out, "  // AFTER (fixed):\n{}\n", after);
            }
        }
        None => {
            let _ = writeln!(out, "Error: {}\n", code);
            out.push_str("Analysis:\n  This is a build error that requires investigation.\n\n");
            out.push_str("Suggested Steps:\n");
            out.push_str("  1. Check the full error message in the build output\n");
            out.push_str("  2. Search the team wiki for the error code\n");
            out.push_str("  3. Check the local error database\n\n");
        }
    }

    section(&mut out, "External Search Results");
    if result.external_results.is_empty() {
        out.push_str("No similar errors found.\n\n");
        if let Some(url) = page_url {
            let _ = writeln!(out, "You can create a new page at:\n{}\n", url);
        }
    } else {
        out.push_str("Found similar errors:\n\n");
        for hit in &result.external_results {
            let _ = writeln!(out, "Title: {}\nURL: {}\n", hit.title, hit.link);
        }
    }

    section(&mut out, "Error Location");
    let _ = writeln!(out, "Service: {}", or_unknown(inquiry.service.as_deref()));
    let _ = writeln!(out, "File: {}", or_unknown(inquiry.file.as_deref()));
    let _ = writeln!(out, "Line: {}\n", or_unknown(inquiry.line.as_deref()));

    if result.newly_recorded {
        let _ = writeln!(out, "Recorded {} in the local error database.\n", code);
    }

    section(&mut out, "Next Steps");
    out.push_str("1. Review the error details above\n");
    out.push_str("2. Apply the suggested fix to your code\n");
    out.push_str("3. Rebuild to verify the fix\n");
    out.push_str("4. Commit and push your changes\n");

    out
}

pub fn render_json(result: &InvestigationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn section(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{}\n{}\n{}\n", rule, title, rule);
}
